//! ConsoleBus - ordered broadcast of one execution's output.
//!
//! Every publish is handed to a dedicated background task which fans it out
//! to all subscribers in registration order before the next publish is
//! looked at. Subscribers receive the history accumulated *before* the chunk
//! alongside the chunk itself, so a subscriber that attached late can catch
//! up on its first delivery.
//!
//! `publish` only returns once fan-out for that chunk has completed: a slow
//! subscriber slows the producer down instead of losing output.
//!
//! History grows without bound for the lifetime of the bus.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

/// Capacity of the command queue in front of the bus task
const COMMAND_QUEUE_SIZE: usize = 64;

/// A unit published on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Output bytes, appended to history after fan-out
    Data(Vec<u8>),
    /// The execution has exited; delivered once, never appended
    Terminated,
}

impl Chunk {
    /// Whether this is the termination sentinel
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Bus error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// The termination sentinel was already delivered
    #[error("bus already terminated")]
    Terminated,
    /// The bus was closed and released its resources
    #[error("bus closed")]
    Closed,
}

/// Receiver of bus deliveries
///
/// Called once per publish made after registration, from the bus task, with
/// the history as of that publish (not including `chunk`).
#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    /// Handle one published chunk
    async fn on_chunk(&self, history: &[u8], chunk: &Chunk);
}

/// Handle used to remove a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

struct BusState {
    /// Keyed by token; tokens increase, so iteration is registration order
    subscribers: BTreeMap<u64, Arc<dyn Subscriber>>,
    next_token: u64,
    history: Vec<u8>,
    terminated: bool,
    closed: bool,
}

impl BusState {
    fn check_open(&self) -> Result<(), BusError> {
        if self.closed {
            Err(BusError::Closed)
        } else if self.terminated {
            Err(BusError::Terminated)
        } else {
            Ok(())
        }
    }
}

enum BusCommand {
    Publish {
        chunk: Chunk,
        ack: oneshot::Sender<Result<(), BusError>>,
    },
    Close {
        ack: oneshot::Sender<()>,
    },
}

/// Single-producer, multi-consumer broadcast with replayable history
pub struct ConsoleBus {
    cmd_tx: mpsc::Sender<BusCommand>,
    state: Arc<Mutex<BusState>>,
}

impl ConsoleBus {
    /// Create a bus and spawn its fan-out task on the current runtime
    #[must_use]
    pub fn new() -> Self {
        let state = Arc::new(Mutex::new(BusState {
            subscribers: BTreeMap::new(),
            next_token: 0,
            history: Vec::new(),
            terminated: false,
            closed: false,
        }));

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        tokio::spawn(Self::run_loop(cmd_rx, state.clone()));

        Self { cmd_tx, state }
    }

    /// Publish a chunk and wait until every subscriber has received it
    ///
    /// After `Chunk::Terminated` has been delivered, further publishes are
    /// rejected with `BusError::Terminated` and reach nobody.
    pub async fn publish(&self, chunk: Chunk) -> Result<(), BusError> {
        let (ack, done) = oneshot::channel();
        self.cmd_tx
            .send(BusCommand::Publish { chunk, ack })
            .await
            .map_err(|_| BusError::Closed)?;
        done.await.map_err(|_| BusError::Closed)?
    }

    /// Register a subscriber for every publish from the next one onward
    ///
    /// Waits for an in-flight fan-out to finish, so the subscriber is never
    /// included halfway through a delivery.
    pub async fn subscribe(
        &self,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<SubscriptionToken, BusError> {
        let mut state = self.state.lock().await;
        state.check_open()?;

        let token = state.next_token;
        state.next_token += 1;
        state.subscribers.insert(token, subscriber);
        debug!(token, "Subscriber registered");
        Ok(SubscriptionToken(token))
    }

    /// Remove a subscriber; a no-op if it is already gone
    pub async fn unsubscribe(&self, token: SubscriptionToken) {
        let mut state = self.state.lock().await;
        if state.subscribers.remove(&token.0).is_some() {
            debug!(token = token.0, "Subscriber removed");
        }
    }

    /// Stop the bus task and drop every subscriber
    ///
    /// Publishes queued before the close are still processed first.
    pub async fn close(&self) {
        let (ack, done) = oneshot::channel();
        if self.cmd_tx.send(BusCommand::Close { ack }).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Snapshot of everything published so far
    pub async fn history(&self) -> Vec<u8> {
        self.state.lock().await.history.clone()
    }

    /// Number of registered subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }

    /// Whether the termination sentinel has been delivered
    pub async fn is_terminated(&self) -> bool {
        self.state.lock().await.terminated
    }

    // ── background task ──────────────────────────────────────────────

    async fn run_loop(mut cmd_rx: mpsc::Receiver<BusCommand>, state: Arc<Mutex<BusState>>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                BusCommand::Publish { chunk, ack } => {
                    let result = Self::fan_out(&state, chunk).await;
                    let _ = ack.send(result);
                }
                BusCommand::Close { ack } => {
                    let mut guard = state.lock().await;
                    if !guard.terminated {
                        warn!("Closing console bus before termination was delivered");
                    }
                    guard.closed = true;
                    guard.subscribers.clear();
                    drop(guard);
                    let _ = ack.send(());
                    break;
                }
            }
        }

        // Anything still queued behind the close is answered with `Closed`
        // when the receiver drops.
        debug!("Console bus task shutting down");
    }

    async fn fan_out(state: &Mutex<BusState>, chunk: Chunk) -> Result<(), BusError> {
        let mut guard = state.lock().await;
        if let Err(e) = guard.check_open() {
            warn!("Rejected publish on finished bus: {}", e);
            return Err(e);
        }

        let state = &mut *guard;
        for subscriber in state.subscribers.values() {
            subscriber.on_chunk(&state.history, &chunk).await;
        }

        match chunk {
            Chunk::Data(bytes) => state.history.extend_from_slice(&bytes),
            Chunk::Terminated => state.terminated = true,
        }
        Ok(())
    }
}

impl Default for ConsoleBus {
    fn default() -> Self {
        Self::new()
    }
}
