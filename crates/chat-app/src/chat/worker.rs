use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use colorchat_client::ChatTransport;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};

use super::events::{ReplyEvent, ReplyOutcome, RequestTarget};

/// Owner side of a spawned request. Cancelling or dropping it stops the
/// worker before it posts anything.
#[derive(Debug)]
pub struct ReplyHandle {
    target: RequestTarget,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ReplyHandle {
    pub fn target(&self) -> RequestTarget {
        self.target
    }

    pub fn cancel(&mut self) -> bool {
        self.cancel_tx
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

impl Drop for ReplyHandle {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

/// Spawns one request onto the current tokio runtime.
pub fn spawn_reply_worker(
    transport: Arc<dyn ChatTransport>,
    target: RequestTarget,
    message: String,
    reply_timeout: Duration,
    event_tx: mpsc::UnboundedSender<ReplyEvent>,
) -> ReplyHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    tokio::spawn(run_reply_worker(
        transport,
        target,
        message,
        reply_timeout,
        event_tx,
        cancel_rx,
    ));

    ReplyHandle {
        target,
        cancel_tx: Some(cancel_tx),
    }
}

async fn run_reply_worker(
    transport: Arc<dyn ChatTransport>,
    target: RequestTarget,
    message: String,
    reply_timeout: Duration,
    event_tx: mpsc::UnboundedSender<ReplyEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    // A panicking transport still has to settle the request, otherwise the
    // widget would wait on it forever.
    let request = AssertUnwindSafe(settle_request(
        transport.as_ref(),
        target,
        &message,
        reply_timeout,
    ))
    .catch_unwind();

    let outcome = tokio::select! {
        _ = &mut cancel_rx => {
            tracing::debug!(request = ?target, "reply worker cancelled");
            return;
        }
        settled = request => match settled {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(
                    request = ?target,
                    endpoint = %transport.endpoint(),
                    "chat transport panicked"
                );
                ReplyOutcome::Unreachable {
                    details: "chat transport panicked".to_string(),
                }
            }
        },
    };

    if let ReplyOutcome::Unreachable { details } = &outcome {
        tracing::warn!(request = ?target, details = %details, "chat endpoint unreachable");
    }

    if event_tx.send(ReplyEvent { target, outcome }).is_err() {
        tracing::debug!(request = ?target, "widget dropped before reply arrived");
    }
}

async fn settle_request(
    transport: &dyn ChatTransport,
    target: RequestTarget,
    message: &str,
    reply_timeout: Duration,
) -> ReplyOutcome {
    match tokio::time::timeout(reply_timeout, transport.post_message(message)).await {
        Ok(result) => ReplyOutcome::from(result),
        Err(_) => {
            tracing::warn!(
                request = ?target,
                endpoint = %transport.endpoint(),
                timeout_ms = reply_timeout.as_millis() as u64,
                "chat request timed out"
            );
            ReplyOutcome::Unreachable {
                details: format!("no reply within {} ms", reply_timeout.as_millis()),
            }
        }
    }
}
