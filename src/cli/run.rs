//! `webconsole run` - execute one command through the live console pipeline

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use webconsole_core::{ChannelSink, ConsoleFrame, ConsoleService, Error, ExecutionId};
use webconsole_store::ExecutionRecord;

use crate::server::{build_service, load_config};

/// Process exit code used when the command's status is not an exit code
const UNKNOWN_PROCESS_EXIT: i32 = 1;

pub async fn run(command: &str) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let id = service.runner().start(command).await?;
    debug!(execution_id = id, "Started");

    let (sink, mut rx) = ChannelSink::new(config.console.frame_buffer);
    let mut stdout = tokio::io::stdout();
    match service.exporter().attach(id, sink).await {
        Ok(attachment) => {
            while let Some(frame) = rx.recv().await {
                if let ConsoleFrame::Output(text) = frame {
                    stdout.write_all(text.as_bytes()).await?;
                    stdout.flush().await?;
                }
            }
            let reason = attachment.closed().await;
            debug!(execution_id = id, ?reason, "Console stream ended");
        }
        // Finished before we could attach; print what was stored instead
        Err(Error::NotFound(_)) => {
            let record = wait_for_record(&service, id).await?;
            stdout.write_all(&record.output).await?;
            stdout.flush().await?;
        }
        Err(e) => return Err(e.into()),
    }

    let record = wait_for_record(&service, id).await?;
    let status = record.status.unwrap_or(UNKNOWN_PROCESS_EXIT);
    if status != 0 {
        std::process::exit(process_exit_code(status));
    }
    Ok(())
}

fn process_exit_code(status: i32) -> i32 {
    if (0..=255).contains(&status) {
        status
    } else {
        UNKNOWN_PROCESS_EXIT
    }
}

async fn wait_for_record(service: &ConsoleService, id: ExecutionId) -> Result<ExecutionRecord> {
    loop {
        let record = service
            .store()
            .get(id)
            .await?
            .with_context(|| format!("execution {id} disappeared"))?;
        if record.is_finished() {
            return Ok(record);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
