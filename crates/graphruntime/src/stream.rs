//! Progress stream encoding.
//!
//! Run events and log lines are framed as server-sent events: every
//! payload line is prefixed with `data: ` and a record ends with a blank
//! line. Lines starting with `:` are comments and carry no data.

use crate::session::SessionGuard;
use futures::stream::{self, Stream, StreamExt};
use graphcore::{LogLine, RunEvent, RunOutcome};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Comment sent on idle log streams
pub const KEEP_ALIVE: &str = ": keep-alive\n\n";

/// Event sequence of one attached run.
///
/// Always ends with exactly one `End`: if the run's worker goes away
/// without sending one, a failed outcome is synthesized. The session is
/// released as soon as the terminal event is handed out.
pub struct RunStream {
    events: mpsc::Receiver<RunEvent>,
    guard: Option<SessionGuard>,
    finished: bool,
}

impl RunStream {
    pub(crate) fn new(events: mpsc::Receiver<RunEvent>, guard: SessionGuard) -> Self {
        Self {
            events,
            guard: Some(guard),
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.guard.take();
    }
}

impl Stream for RunStream {
    type Item = RunEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.events.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finish();
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                tracing::error!("Run ended without a terminal event");
                self.finish();
                Poll::Ready(Some(RunEvent::End(RunOutcome::failed(
                    "run terminated before completion",
                ))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Frame a payload as one server-sent event record
pub fn frame(payload: &str) -> String {
    let mut record = String::with_capacity(payload.len() + 8);
    for line in payload.split('\n') {
        record.push_str("data: ");
        record.push_str(line.trim_end_matches('\r'));
        record.push('\n');
    }
    record.push('\n');
    record
}

/// Frame a comment record, ignored by clients
pub fn comment(text: &str) -> String {
    format!(": {}\n\n", text.replace('\n', " "))
}

/// Text form of a run event: `PROCESSING <id>`, `DONE <id>` or `END <json>`
pub fn event_payload(event: &RunEvent) -> String {
    match event {
        RunEvent::Processing { node_id } => format!("PROCESSING {}", node_id),
        RunEvent::Done { node_id } => format!("DONE {}", node_id),
        RunEvent::End(outcome) => {
            let json = serde_json::to_string(outcome).unwrap_or_else(|e| {
                tracing::error!("Failed to serialize run outcome: {}", e);
                serde_json::json!({
                    "order": [],
                    "results": {},
                    "error": format!("failed to serialize results: {}", e),
                })
                .to_string()
            });
            format!("END {}", json)
        }
    }
}

pub fn encode_event(event: &RunEvent) -> String {
    frame(&event_payload(event))
}

/// Encode an attached run as server-sent event records
pub fn encode_run(run: RunStream) -> impl Stream<Item = String> + Send + 'static {
    run.map(|event| encode_event(&event))
}

/// Encode the log channel, with keep-alive comments while idle.
///
/// Ends when the channel closes.
pub fn log_stream(
    receiver: broadcast::Receiver<LogLine>,
    keepalive: Duration,
) -> impl Stream<Item = String> + Send + 'static {
    stream::unfold(receiver, move |mut receiver| async move {
        let record = match tokio::time::timeout(keepalive, receiver.recv()).await {
            Ok(Ok(line)) => frame(&line.render()),
            Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                comment(&format!("skipped {} log lines", skipped))
            }
            Ok(Err(broadcast::error::RecvError::Closed)) => return None,
            Err(_) => KEEP_ALIVE.to_string(),
        };
        Some((record, receiver))
    })
}
