//! SSE framing for action streams.
//!
//! Frames: `event: action` per action, a terminal `event: done`, or
//! `event: error` before the stream closes. The orchestrator's emit callback
//! feeds an unbounded channel so emission never blocks inside the merge
//! loop; the channel closing ends the response body.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use dawproto::Action;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type EventStream = Sse<KeepAliveStream<UnboundedReceiverStream<Result<Event, Infallible>>>>;

pub struct SseSink {
    tx: mpsc::UnboundedSender<Result<Event, Infallible>>,
}

impl SseSink {
    pub fn channel() -> (SseSink, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sse = Sse::new(UnboundedReceiverStream::new(rx)).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("ping"),
        );
        (SseSink { tx }, sse)
    }

    pub fn action(&self, action: &Action) {
        match Event::default().event("action").json_data(action) {
            Ok(event) => {
                let _ = self.tx.send(Ok(event));
            }
            Err(e) => tracing::warn!(error = %e, "failed to frame action event"),
        }
    }

    pub fn done(&self) {
        let _ = self.tx.send(Ok(Event::default().event("done").data("{}")));
    }

    pub fn error(&self, kind: &str, message: &str) {
        let payload = json!({ "message": message, "kind": kind });
        match Event::default().event("error").json_data(&payload) {
            Ok(event) => {
                let _ = self.tx.send(Ok(event));
            }
            Err(e) => tracing::warn!(error = %e, "failed to frame error event"),
        }
    }
}
