//! `webconsole show` - print a stored execution

use anyhow::{Context, Result};
use std::io::Write;
use webconsole_store::{ExecutionRecord, ExecutionStore};

use crate::server::load_config;

pub async fn run(id: i64) -> Result<()> {
    let config = load_config()?;
    let store = ExecutionStore::from_path(&config.db_path())
        .await
        .context("Failed to open database")?;

    let record = store
        .get(id)
        .await?
        .with_context(|| format!("execution {id} not found"))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(summary(&record).as_bytes())?;
    stdout.write_all(&record.output)?;
    stdout.flush()?;
    Ok(())
}

fn summary(record: &ExecutionRecord) -> String {
    let mut out = format!(
        "Execution {}\n  command:  {}\n  state:    {}\n",
        record.id,
        record.command,
        record.state()
    );
    if let Some(code) = record.status {
        out.push_str(&format!("  status:   {code}\n"));
    }
    out.push_str(&format!("  created:  {}\n", record.created_at.to_rfc3339()));
    if let Some(finished) = record.finished_at {
        out.push_str(&format!("  finished: {}\n", finished.to_rfc3339()));
    }
    out.push('\n');
    out
}
