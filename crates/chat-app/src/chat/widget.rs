use std::sync::Arc;
use std::time::Duration;

use colorchat_client::{ChatTransport, DEFAULT_REQUEST_TIMEOUT};
use colorchat_storage::{HistoryRepository, KeyValueStore, Message, StorageError};
use tokio::sync::mpsc;

use super::events::{
    Generation, IgnoreReason, ReplyEvent, ReplyOutcome, RequestTarget, SendOutcome, WidgetEvent,
};
use super::render::{WidgetView, render_messages};
use super::worker::{ReplyHandle, spawn_reply_worker};
use crate::clock::{Clock, LocalClock};
use crate::texts;

/// Chat panel controller.
///
/// The message list held here is the single source of truth: persistence
/// serializes it directly and [`ChatWidget::render`] projects it. Every
/// mutating action writes the full list back before returning.
pub struct ChatWidget<S> {
    history: HistoryRepository<S>,
    transport: Arc<dyn ChatTransport>,
    clock: Arc<dyn Clock>,
    reply_timeout: Duration,
    messages: Vec<Message>,
    input: String,
    open: bool,
    generation: Generation,
    next_request_id: u64,
    in_flight: Option<ReplyHandle>,
    reply_tx: mpsc::UnboundedSender<ReplyEvent>,
    reply_rx: mpsc::UnboundedReceiver<ReplyEvent>,
    events: Vec<WidgetEvent>,
}

impl<S> ChatWidget<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S, transport: Arc<dyn ChatTransport>) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            history: HistoryRepository::new(store),
            transport,
            clock: Arc::new(LocalClock),
            reply_timeout: DEFAULT_REQUEST_TIMEOUT,
            messages: Vec::new(),
            input: String::new(),
            open: false,
            generation: Generation::new(0),
            next_request_id: 1,
            in_flight: None,
            reply_tx,
            reply_rx,
            events: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Loads history into a closed panel.
    pub fn initialize(&mut self) {
        self.open = false;
        self.load_history();
        tracing::info!(
            endpoint = %self.transport.endpoint(),
            message_count = self.messages.len(),
            "chat widget initialized"
        );
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history(&self) -> &HistoryRepository<S> {
        &self.history
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn take_events(&mut self) -> Vec<WidgetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn render(&self) -> WidgetView {
        WidgetView {
            open: self.open,
            awaiting_reply: self.is_awaiting_reply(),
            message_count: self.messages.len(),
            markup: render_messages(&self.messages, self.is_awaiting_reply()),
        }
    }

    /// Opens a closed panel and closes an open one. Never touches storage.
    pub fn toggle(&mut self) {
        self.open = !self.open;
        if self.open {
            self.events.push(WidgetEvent::FocusInput);
            self.events.push(WidgetEvent::ScrollToLatest);
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.save_history();
    }

    /// Sends whatever is in the input buffer.
    pub fn submit_input(&mut self) -> SendOutcome {
        let text = self.input.clone();
        self.send(&text)
    }

    /// Appends the user message and dispatches it to the endpoint.
    ///
    /// Blank text and sends while a reply is outstanding are ignored, so at
    /// most one request is in flight at any time.
    pub fn send(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoreReason::BlankInput);
        }

        if let Some(handle) = &self.in_flight {
            tracing::debug!(active = ?handle.target(), "send ignored while a reply is outstanding");
            return SendOutcome::Ignored(IgnoreReason::AwaitingReply);
        }

        self.push_message(Message::user(text, self.clock.now_hhmm()));
        self.input.clear();
        self.save_history();

        let target = RequestTarget::new(self.generation, self.next_request_id);
        // Reserve the next id immediately so a later send never reuses a target.
        self.next_request_id = self.next_request_id.saturating_add(1);

        self.events.push(WidgetEvent::TypingStarted);
        self.events.push(WidgetEvent::ScrollToLatest);
        self.in_flight = Some(spawn_reply_worker(
            self.transport.clone(),
            target,
            text.to_string(),
            self.reply_timeout,
            self.reply_tx.clone(),
        ));

        tracing::debug!(request = ?target, "chat request dispatched");
        SendOutcome::Dispatched(target)
    }

    /// Waits for the outstanding reply and applies it. Returns the appended
    /// bot message, or `None` when nothing is outstanding.
    pub async fn next_reply(&mut self) -> Option<Message> {
        while self.in_flight.is_some() {
            let event = self.reply_rx.recv().await?;
            if let Some(message) = self.apply_reply(event) {
                return Some(message);
            }
        }

        None
    }

    /// Applies every reply that has already arrived without waiting.
    pub fn poll_replies(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.reply_rx.try_recv() {
            if self.apply_reply(event).is_some() {
                applied += 1;
            }
        }
        applied
    }

    fn apply_reply(&mut self, event: ReplyEvent) -> Option<Message> {
        let is_current = self
            .in_flight
            .as_ref()
            .is_some_and(|handle| handle.target() == event.target);
        if !is_current {
            tracing::debug!(
                request = ?event.target,
                generation = self.generation.0,
                "dropping stale reply"
            );
            return None;
        }

        self.in_flight = None;
        self.events.push(WidgetEvent::TypingStopped);

        let message = match event.outcome {
            ReplyOutcome::Answered {
                response,
                timestamp,
            } => {
                let timestamp = timestamp.unwrap_or_else(|| self.clock.now_hhmm());
                Message::bot(response, timestamp)
            }
            ReplyOutcome::Refused { status, error } => {
                tracing::warn!(status, error = %error, "chat endpoint returned an error");
                Message::bot(texts::server_error(&error), self.clock.now_hhmm())
            }
            ReplyOutcome::Unreachable { .. } => {
                Message::bot(texts::CONNECTION_ERROR, self.clock.now_hhmm())
            }
        };

        self.push_message(message.clone());
        self.save_history();
        Some(message)
    }

    /// Replays stored history, or greets when there is none.
    pub fn load_history(&mut self) {
        self.messages.clear();

        match self.history.load() {
            Ok(Some(messages)) => {
                // Bulk replay: no per-item scroll and no write-back.
                self.messages = messages;
                tracing::info!(message_count = self.messages.len(), "chat history loaded");
            }
            Ok(None) => {
                self.push_message(Message::bot(texts::GREETING, self.clock.now_hhmm()));
                self.save_history();
            }
            Err(error @ StorageError::CorruptHistory { .. }) => {
                tracing::warn!(error = %error, "stored chat history is corrupt; starting over");
                match self.history.quarantine_corrupt() {
                    Ok(preserved) => {
                        tracing::info!(preserved_bytes = ?preserved, "corrupt history set aside")
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "failed to set aside corrupt history")
                    }
                }
                self.push_message(Message::bot(texts::GREETING, self.clock.now_hhmm()));
                self.save_history();
            }
            Err(error) => {
                // Unreadable store: greet, but leave whatever is stored untouched.
                tracing::error!(error = %error, "failed to read chat history");
                self.push_message(Message::bot(texts::GREETING, self.clock.now_hhmm()));
            }
        }
    }

    /// Writes the message list. Failures are logged and swallowed.
    pub fn save_history(&mut self) {
        match self.history.save(&self.messages) {
            Ok(message_count) => {
                tracing::debug!(message_count, "chat history saved");
                self.events
                    .push(WidgetEvent::HistoryPersisted { message_count });
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to save chat history");
            }
        }
    }

    /// Drops the whole conversation and leaves a single notice.
    ///
    /// An outstanding request is cancelled and its generation retired, so a
    /// reply to it can never land in the new history.
    pub fn clear_history(&mut self) {
        self.abandon_in_flight();
        self.generation = self.generation.next();

        if let Err(error) = self.history.clear() {
            tracing::error!(error = %error, "failed to remove stored chat history");
        }

        self.messages.clear();
        self.push_message(Message::bot(texts::HISTORY_CLEARED, self.clock.now_hhmm()));
        self.save_history();
        tracing::info!(generation = self.generation.0, "chat history cleared");
    }

    /// Called when the host goes away: stops the outstanding request and
    /// persists.
    pub fn unload(&mut self) {
        self.abandon_in_flight();
        self.save_history();
    }

    fn abandon_in_flight(&mut self) {
        if let Some(mut handle) = self.in_flight.take() {
            handle.cancel();
            self.events.push(WidgetEvent::TypingStopped);
            tracing::debug!(request = ?handle.target(), "outstanding chat request abandoned");
        }
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.events.push(WidgetEvent::ScrollToLatest);
    }
}
