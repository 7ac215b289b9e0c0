//! StreamingExporter - viewer attachment
//!
//! Subscribes a viewer's outbound sink to the bus of a live execution and
//! translates bus deliveries into console frames:
//!
//! - first data delivery: accumulated history (if any), then the chunk
//! - later data deliveries: the chunk
//! - termination: history for a viewer that never saw data, then `Exit`
//!
//! Every frame is flushed as soon as it is written. The exporter never
//! blocks the producer on a viewer that went away: a failed send marks the
//! viewer disconnected and every later delivery is ignored.

use crate::bus::{Chunk, ConsoleBus, Subscriber, SubscriptionToken};
use crate::error::{Error, Result};
use crate::registry::ExecutionRegistry;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info};
use webconsole_store::ExecutionId;

/// SSE event name of an output frame
pub const OUTPUT_EVENT: &str = "console-output";

/// SSE event name of the exit frame
pub const EXIT_EVENT: &str = "console-exit";

/// One outbound console event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleFrame {
    /// A piece of output, decoded as UTF-8 with invalid sequences replaced
    Output(String),
    /// The command has exited
    Exit,
}

impl ConsoleFrame {
    fn output(bytes: &[u8]) -> Self {
        Self::Output(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Event name on the wire
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Output(_) => OUTPUT_EVENT,
            Self::Exit => EXIT_EVENT,
        }
    }

    /// Event payload on the wire
    ///
    /// Output frames carry `{"output": "..."}`, the exit frame carries `0`.
    #[must_use]
    pub fn data(&self) -> String {
        match self {
            Self::Output(text) => serde_json::json!({ "output": text }).to_string(),
            Self::Exit => "0".to_string(),
        }
    }
}

/// The receiving side of a sink has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sink closed")]
pub struct SinkClosed;

/// Outbound transport of one viewer
#[async_trait::async_trait]
pub trait FrameSink: Send + Sync + 'static {
    /// Whether frames can be delivered one at a time, ahead of completion
    fn is_incremental(&self) -> bool {
        true
    }

    /// Write one frame
    async fn send(&self, frame: ConsoleFrame) -> std::result::Result<(), SinkClosed>;

    /// Push written frames out to the viewer
    async fn flush(&self) -> std::result::Result<(), SinkClosed> {
        Ok(())
    }
}

/// Sink feeding a bounded channel
///
/// Frames are handed over as they are sent, so `flush` has nothing to do.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ConsoleFrame>,
}

impl ChannelSink {
    /// Create a sink and the receiver its frames arrive on
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ConsoleFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl FrameSink for ChannelSink {
    async fn send(&self, frame: ConsoleFrame) -> std::result::Result<(), SinkClosed> {
        self.tx.send(frame).await.map_err(|_| SinkClosed)
    }
}

/// Why a viewer's stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStream {
    /// The exit frame was delivered
    Exited,
    /// The viewer went away
    Disconnected,
    /// The bus was released before termination reached this viewer
    BusClosed,
}

struct ViewerState<S> {
    sink: Option<S>,
    initialized: bool,
    done: Option<oneshot::Sender<EndOfStream>>,
}

impl<S: FrameSink> ViewerState<S> {
    fn finish(&mut self, reason: EndOfStream) {
        self.sink = None;
        if let Some(done) = self.done.take() {
            let _ = done.send(reason);
        }
    }
}

/// Bus subscriber writing to one viewer's sink
struct ConsoleSubscriber<S> {
    execution_id: ExecutionId,
    state: Mutex<ViewerState<S>>,
}

impl<S: FrameSink> ConsoleSubscriber<S> {
    async fn write(sink: &S, frames: Vec<ConsoleFrame>) -> std::result::Result<(), SinkClosed> {
        for frame in frames {
            sink.send(frame).await?;
        }
        sink.flush().await
    }
}

#[async_trait::async_trait]
impl<S: FrameSink> Subscriber for ConsoleSubscriber<S> {
    async fn on_chunk(&self, history: &[u8], chunk: &Chunk) {
        let mut state = self.state.lock().await;
        let Some(sink) = state.sink.as_ref() else {
            return;
        };

        let mut frames = Vec::with_capacity(2);
        if !state.initialized && !history.is_empty() {
            frames.push(ConsoleFrame::output(history));
        }
        match chunk {
            Chunk::Data(bytes) if !bytes.is_empty() => frames.push(ConsoleFrame::output(bytes)),
            Chunk::Data(_) => {}
            Chunk::Terminated => frames.push(ConsoleFrame::Exit),
        }

        let result = Self::write(sink, frames).await;
        state.initialized = true;

        match (result, chunk.is_terminated()) {
            (Err(SinkClosed), _) => {
                debug!(execution_id = self.execution_id, "Viewer disconnected");
                state.finish(EndOfStream::Disconnected);
            }
            (Ok(()), true) => state.finish(EndOfStream::Exited),
            (Ok(()), false) => {}
        }
    }
}

/// A viewer subscribed to a live execution
///
/// Dropping the attachment unsubscribes the viewer.
pub struct Attachment {
    execution_id: ExecutionId,
    bus: Arc<ConsoleBus>,
    token: SubscriptionToken,
    done: Option<oneshot::Receiver<EndOfStream>>,
    detached: bool,
}

impl Attachment {
    /// Execution being watched
    #[must_use]
    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Wait until the viewer's stream ends, then unsubscribe
    pub async fn closed(mut self) -> EndOfStream {
        let reason = match self.done.take() {
            Some(done) => done.await.unwrap_or(EndOfStream::BusClosed),
            None => EndOfStream::BusClosed,
        };
        self.bus.unsubscribe(self.token).await;
        self.detached = true;
        debug!(execution_id = self.execution_id, ?reason, "Viewer detached");
        reason
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let bus = self.bus.clone();
            let token = self.token;
            handle.spawn(async move {
                bus.unsubscribe(token).await;
            });
        }
    }
}

/// Attaches viewers to live executions
pub struct StreamingExporter {
    registry: Arc<ExecutionRegistry>,
}

impl StreamingExporter {
    /// Create an exporter over the given registry
    pub fn new(registry: Arc<ExecutionRegistry>) -> Self {
        Self { registry }
    }

    /// Subscribe a sink to a live execution
    ///
    /// Fails with `NotIncremental` before touching the registry if the sink
    /// cannot deliver frames ahead of completion, and with `NotFound` if the
    /// execution never existed or has already finished.
    pub async fn attach<S: FrameSink>(&self, id: ExecutionId, sink: S) -> Result<Attachment> {
        if !sink.is_incremental() {
            return Err(Error::NotIncremental);
        }

        let bus = self.registry.lookup(id).await.ok_or(Error::NotFound(id))?;

        let (done_tx, done_rx) = oneshot::channel();
        let subscriber = Arc::new(ConsoleSubscriber {
            execution_id: id,
            state: Mutex::new(ViewerState {
                sink: Some(sink),
                initialized: false,
                done: Some(done_tx),
            }),
        });

        // Termination can win the race between lookup and subscribe
        let token = bus
            .subscribe(subscriber)
            .await
            .map_err(|_| Error::NotFound(id))?;

        info!(execution_id = id, "Viewer attached");
        Ok(Attachment {
            execution_id: id,
            bus,
            token,
            done: Some(done_rx),
            detached: false,
        })
    }
}
