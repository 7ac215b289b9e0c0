//! Webconsole Core - live console fan-out
//!
//! This crate runs submitted shell commands and streams their output to any
//! number of viewers:
//! - Bus: per-execution ordered broadcast with replayable history
//! - Registry: live execution id to bus directory
//! - Runner: subprocess lifecycle, persistence and termination
//! - Exporter: viewer attachment and outbound frame serialization
//! - Service: the process-wide object wiring them together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bus;
pub mod error;
pub mod exporter;
pub mod registry;
pub mod runner;
pub mod service;

#[cfg(test)]
mod test_support;

pub use bus::{BusError, Chunk, ConsoleBus, Subscriber, SubscriptionToken};
pub use error::{Error, Result};
pub use exporter::{
    Attachment, ChannelSink, ConsoleFrame, EndOfStream, FrameSink, SinkClosed, StreamingExporter,
};
pub use registry::{ExecutionRegistry, RegistryGuard};
pub use runner::{normalize_command, CommandRunner, RunnerConfig};
pub use service::ConsoleService;
pub use webconsole_store::{ExecutionId, ExecutionRecord, UNKNOWN_EXIT_CODE};
