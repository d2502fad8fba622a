use colorchat_client::{TransportError, create_transport};
use colorchat_storage::{JsonFileStore, KeyValueStore, Message, Sender};
use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::{ChatWidget, Generation, IgnoreReason, SendOutcome, WidgetEvent};
use crate::settings::{SettingsError, SettingsStore, WidgetSettings};
use crate::texts;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("failed to set up the chat transport on `{stage}`: {source}"))]
    Transport {
        stage: &'static str,
        source: TransportError,
    },
    #[snafu(display("failed to write default settings on `{stage}`: {source}"))]
    Settings {
        stage: &'static str,
        source: SettingsError,
    },
    #[snafu(display("failed to read terminal input on `{stage}`: {source}"))]
    Terminal {
        stage: &'static str,
        source: std::io::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// Builds the one widget instance the host owns for its whole lifetime.
pub fn build_widget(settings: &WidgetSettings) -> AppResult<ChatWidget<JsonFileStore>> {
    let transport = create_transport(settings.transport_config()).context(TransportSnafu {
        stage: "build-widget-transport",
    })?;
    let store = JsonFileStore::new(settings.history_path());
    tracing::debug!(history_path = ?store.path(), "history store selected");

    Ok(ChatWidget::new(store, transport).with_reply_timeout(settings.request_timeout()))
}

/// One line of terminal input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Send(String),
    Toggle,
    Close,
    Clear,
    History,
    Help,
    Quit,
}

impl HostCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/open" | "/toggle" => Self::Toggle,
            "/close" => Self::Close,
            "/clear" => Self::Clear,
            "/history" => Self::History,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Send(line.to_string()),
        }
    }
}

pub const HELP_TEXT: &str = "/open  toggle the panel\n/close  close the panel\n/clear  clear the history\n/history  print the stored history\n/quit  save and exit";

/// Plain-text rendering of one message for the terminal.
pub fn transcript_line(message: &Message) -> String {
    let speaker = match message.sender {
        Sender::User => "вы",
        Sender::Bot => "бот",
    };
    format!(
        "[{}] {}: {}",
        terminal_safe(&message.timestamp),
        speaker,
        terminal_safe(&message.text)
    )
}

/// Escapes control characters other than newlines so text from the server
/// cannot drive the terminal.
pub fn terminal_safe(text: &str) -> String {
    let mut safe = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_control() && ch != '\n' {
            safe.extend(ch.escape_default());
        } else {
            safe.push(ch);
        }
    }
    safe
}

pub fn is_confirmation(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "y" | "yes" | "д" | "да"
    )
}

enum TerminalStep {
    Line(Option<String>),
    Reply,
}

/// Tracks which part of the conversation is already on screen.
struct Transcript {
    printed: usize,
    generation: Generation,
}

impl Transcript {
    fn new<S: KeyValueStore>(widget: &ChatWidget<S>) -> Self {
        Self {
            printed: 0,
            generation: widget.generation(),
        }
    }

    fn reprint_all(&mut self) {
        self.printed = 0;
    }

    fn print_new<S: KeyValueStore>(&mut self, widget: &ChatWidget<S>) {
        let messages = widget.messages();
        if widget.generation() != self.generation || messages.len() < self.printed {
            self.generation = widget.generation();
            self.printed = 0;
        }

        for message in &messages[self.printed..] {
            println!("{}", transcript_line(message));
        }
        self.printed = messages.len();
    }
}

/// Loads settings, writing defaults on first run.
pub fn load_settings() -> AppResult<WidgetSettings> {
    let store = SettingsStore::load();
    if store.ensure_persisted().context(SettingsSnafu {
        stage: "persist-default-settings",
    })? {
        tracing::info!(path = ?store.config_path(), "wrote default settings");
    }
    Ok(store.settings().clone())
}

/// Drives one widget from stdin until `/quit` or end of input.
pub async fn run_terminal(settings: &WidgetSettings) -> AppResult<()> {
    let mut widget = build_widget(settings)?;
    widget.initialize();

    println!("{}", texts::WIDGET_TITLE);
    println!("{HELP_TEXT}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut transcript = Transcript::new(&widget);
    let mut confirming_clear = false;

    loop {
        let awaiting_reply = widget.is_awaiting_reply();
        let step = tokio::select! {
            line = lines.next_line() => TerminalStep::Line(line.context(TerminalSnafu {
                stage: "read-terminal-line",
            })?),
            _ = widget.next_reply(), if awaiting_reply => TerminalStep::Reply,
        };

        let line = match step {
            TerminalStep::Reply => None,
            TerminalStep::Line(None) => {
                widget.unload();
                break;
            }
            TerminalStep::Line(Some(line)) => Some(line),
        };

        if let Some(line) = line {
            if confirming_clear {
                confirming_clear = false;
                if is_confirmation(&line) {
                    widget.clear_history();
                }
            } else {
                match HostCommand::parse(&line) {
                    HostCommand::Send(text) => {
                        if !widget.is_open() {
                            widget.toggle();
                        }
                        widget.set_input(text);
                        if widget.submit_input()
                            == SendOutcome::Ignored(IgnoreReason::AwaitingReply)
                        {
                            println!("({}...)", texts::TYPING_LABEL);
                        }
                    }
                    HostCommand::Toggle => widget.toggle(),
                    HostCommand::Close => widget.close(),
                    HostCommand::Clear => {
                        println!("{} [y/N]", texts::CLEAR_CONFIRMATION);
                        confirming_clear = true;
                    }
                    HostCommand::History => {
                        for message in widget.history().read_lenient() {
                            println!("{}", transcript_line(&message));
                        }
                    }
                    HostCommand::Help => println!("{HELP_TEXT}"),
                    HostCommand::Quit => {
                        widget.unload();
                        break;
                    }
                }
            }
        }

        let mut focus_input = false;
        for event in widget.take_events() {
            match event {
                WidgetEvent::FocusInput => {
                    transcript.reprint_all();
                    focus_input = true;
                }
                WidgetEvent::ScrollToLatest if widget.is_open() => transcript.print_new(&widget),
                WidgetEvent::TypingStarted => println!("{}...", texts::TYPING_LABEL),
                WidgetEvent::ScrollToLatest
                | WidgetEvent::TypingStopped
                | WidgetEvent::HistoryPersisted { .. } => {}
            }
        }
        if focus_input && widget.input().is_empty() {
            println!("> {}", texts::INPUT_PLACEHOLDER);
        }
    }

    tracing::info!(message_count = widget.messages().len(), "chat session ended");
    Ok(())
}
