//! Live console stream
//!
//! GET /executions/:id/console - Server-sent events of a running command
//!
//! Emits `console-output` events carrying `{"output": "..."}` and a final
//! `console-exit` event, after which the stream ends.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::Path,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::stream::{self, Stream};
use tracing::debug;

use webconsole_core::{ChannelSink, ConsoleFrame, ConsoleService};

use super::error::ApiError;
use super::executions::parse_execution_id;
use crate::server::config::ConsoleConfig;

fn frame_to_event(frame: &ConsoleFrame) -> Event {
    Event::default().event(frame.event_name()).data(frame.data())
}

/// Attach to a running command and stream its output
pub async fn stream_console(
    Extension(service): Extension<Arc<ConsoleService>>,
    Extension(console): Extension<ConsoleConfig>,
    Path(raw_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let id = parse_execution_id(&raw_id)?;

    let (sink, rx) = ChannelSink::new(console.frame_buffer);
    let attachment = service.exporter().attach(id, sink).await?;
    debug!(execution_id = id, "Console stream opened");

    // The attachment lives as long as the stream; dropping it on client
    // disconnect unsubscribes the viewer.
    let events = stream::unfold((rx, attachment), |(mut rx, attachment)| async move {
        let frame = rx.recv().await?;
        Some((Ok(frame_to_event(&frame)), (rx, attachment)))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Create console routes
pub fn console_routes() -> Router {
    Router::new().route("/executions/:id/console", get(stream_console))
}
