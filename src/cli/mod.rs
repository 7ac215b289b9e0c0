//! CLI module for webconsole
//!
//! - `serve`: start the HTTP server (default)
//! - `run`: run one command and stream its output to the terminal
//! - `show`: print a stored execution

use clap::{Parser, Subcommand};

pub mod run;
pub mod show;

/// Run shell commands and watch their output live
#[derive(Parser, Debug)]
#[command(name = "webconsole")]
#[command(about = "Run shell commands and stream their output to live viewers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Run a command and stream its output here
    Run {
        /// Shell command text
        command: String,
    },
    /// Print a stored execution
    Show {
        /// Execution id
        id: i64,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) | None => crate::server::run().await,
        Some(Commands::Run { command }) => run::run(&command).await,
        Some(Commands::Show { id }) => show::run(id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["webconsole"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["webconsole", "run", "echo hi"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run { command }) if command == "echo hi"));

        let cli = Cli::try_parse_from(["webconsole", "show", "12"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Show { id: 12 })));

        assert!(Cli::try_parse_from(["webconsole", "show", "abc"]).is_err());
    }
}
