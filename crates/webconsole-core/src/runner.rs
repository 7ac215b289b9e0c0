//! CommandRunner - subprocess lifecycle
//!
//! Starts a submitted command under the configured shell, pipes its combined
//! stdout and stderr into a fresh [`ConsoleBus`], and when the process exits
//! persists the final record, signals termination and retires the bus.

use crate::bus::{Chunk, ConsoleBus};
use crate::error::{Error, Result};
use crate::registry::ExecutionRegistry;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::os::fd::OwnedFd;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, instrument, warn};
use webconsole_store::{ExecutionId, ExecutionStoreTrait, UNKNOWN_EXIT_CODE};

/// Subprocess settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Shell program
    pub shell: String,
    /// Arguments placed before the command text
    pub shell_args: Vec<String>,
    /// Largest chunk read from a pipe at once
    pub read_buffer_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
            shell_args: vec!["-c".to_string()],
            read_buffer_size: 4096,
        }
    }
}

/// Validate submitted command text and normalize its line endings
pub fn normalize_command(text: &str) -> Result<String> {
    if text.is_empty() {
        return Err(Error::EmptyCommand);
    }
    Ok(text.replace("\r\n", "\n"))
}

/// Runs commands and drives them to completion
pub struct CommandRunner {
    store: Arc<dyn ExecutionStoreTrait>,
    registry: Arc<ExecutionRegistry>,
    config: RunnerConfig,
}

impl CommandRunner {
    /// Create a runner
    pub fn new(
        store: Arc<dyn ExecutionStoreTrait>,
        registry: Arc<ExecutionRegistry>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Start a command and return its execution id without waiting for it
    ///
    /// The pending record, the registry entry and the subprocess are created
    /// under the registry lock, so the id is resolvable by viewers as soon as
    /// this returns.
    #[instrument(skip(self, command_text))]
    pub async fn start(&self, command_text: &str) -> Result<ExecutionId> {
        let command = normalize_command(command_text)?;

        let mut guard = self.registry.lock().await;
        let id = self.store.create_pending(&command).await?;

        let bus = Arc::new(ConsoleBus::new());
        if let Err(e) = guard.register(id, bus.clone()) {
            error!(execution_id = id, "Failed to register execution: {}", e);
            bus.close().await;
            self.abandon(id).await;
            return Err(e);
        }

        let (child, output) = match self.spawn(&command) {
            Ok(spawned) => spawned,
            Err(e) => {
                error!(execution_id = id, "Failed to spawn command: {}", e);
                guard.unregister(id);
                let _ = bus.publish(Chunk::Terminated).await;
                bus.close().await;
                self.abandon(id).await;
                return Err(Error::Spawn(e.to_string()));
            }
        };
        drop(guard);

        let reader = self.pump(id, output, bus.clone());
        tokio::spawn(Self::await_completion(
            id,
            child,
            reader,
            bus,
            self.store.clone(),
            self.registry.clone(),
        ));

        info!(execution_id = id, "Started execution");
        Ok(id)
    }

    /// Finish a record whose command never ran
    async fn abandon(&self, id: ExecutionId) {
        if let Err(e) = self.store.finish(id, UNKNOWN_EXIT_CODE, &[]).await {
            error!(execution_id = id, "Failed to finish abandoned record: {}", e);
        }
    }

    /// Spawn the shell with stdout and stderr sharing one pipe
    ///
    /// Both streams write into the same pipe, so the read end sees output in
    /// the order the command produced it.
    fn spawn(&self, command: &str) -> std::io::Result<(Child, pipe::Receiver)> {
        let (read_end, write_end) = std::io::pipe()?;
        let stderr_end = write_end.try_clone()?;

        // The temporary Command owns the parent's write ends and drops them
        // at the end of this statement, so EOF follows the child's exit.
        let child = Command::new(&self.config.shell)
            .args(&self.config.shell_args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(write_end)
            .stderr(stderr_end)
            .spawn()?;

        let output = pipe::Receiver::from_owned_fd(OwnedFd::from(read_end))?;
        Ok((child, output))
    }

    /// Forward the output pipe into the bus, chunk by chunk, until EOF
    fn pump<R>(
        &self,
        id: ExecutionId,
        reader: R,
        bus: Arc<ConsoleBus>,
    ) -> tokio::task::JoinHandle<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut chunks = ReaderStream::with_capacity(reader, self.config.read_buffer_size);
        tokio::spawn(async move {
            while let Some(next) = chunks.next().await {
                match next {
                    Ok(bytes) => {
                        if let Err(e) = bus.publish(Chunk::Data(bytes.to_vec())).await {
                            warn!(execution_id = id, "Dropping output: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(execution_id = id, "Failed to read command output: {}", e);
                        break;
                    }
                }
            }
        })
    }

    async fn await_completion(
        id: ExecutionId,
        mut child: Child,
        reader: tokio::task::JoinHandle<()>,
        bus: Arc<ConsoleBus>,
        store: Arc<dyn ExecutionStoreTrait>,
        registry: Arc<ExecutionRegistry>,
    ) {
        let status = match child.wait().await {
            Ok(exit) => exit.code().unwrap_or(UNKNOWN_EXIT_CODE),
            Err(e) => {
                warn!(execution_id = id, "Failed to wait for command: {}", e);
                UNKNOWN_EXIT_CODE
            }
        };

        if let Err(e) = reader.await {
            warn!(execution_id = id, "Output reader failed: {}", e);
        }

        let output = bus.history().await;
        if let Err(e) = store.finish(id, status, &output).await {
            error!(execution_id = id, "Failed to persist finished execution: {}", e);
        }

        if let Err(e) = bus.publish(Chunk::Terminated).await {
            warn!(execution_id = id, "Failed to signal termination: {}", e);
        }
        registry.unregister_and_close(id).await;

        info!(execution_id = id, status, "Execution finished");
        debug!(execution_id = id, output_len = output.len(), "Released console bus");
    }
}
