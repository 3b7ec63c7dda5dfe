use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "veps",
    about = "Verification and Event Processing Service",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a VEPS server for one role.
    Serve {
        /// Surface to expose: boundary, validator, store, fracture, or
        /// standalone (every surface on one listener).
        #[arg(long, default_value = "standalone")]
        role: String,
        /// Bind address override (otherwise VEPS_BIND_ADDR or the default).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Submit a raw event file to a running boundary node.
    Submit {
        /// Path to a JSON submission: {"source", "timestamp"?, "data"}.
        file: PathBuf,
        /// Boundary base URL.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,
    },
    /// Fetch fracture records for a calendar day from an archive node.
    Fractures {
        /// Day to read, YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// Archive base URL.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_to_standalone() {
        let cli = Cli::parse_from(["veps", "serve"]);
        match cli.command {
            Command::Serve { role, bind } => {
                assert_eq!(role, "standalone");
                assert!(bind.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn serve_role_and_bind() {
        let cli = Cli::parse_from(["veps", "serve", "--role", "boundary", "--bind", "0.0.0.0:9000"]);
        match cli.command {
            Command::Serve { role, bind } => {
                assert_eq!(role, "boundary");
                assert_eq!(bind.as_deref(), Some("0.0.0.0:9000"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn fractures_requires_date() {
        assert!(Cli::try_parse_from(["veps", "fractures"]).is_err());
        let cli = Cli::parse_from(["veps", "fractures", "--date", "2026-03-07"]);
        match cli.command {
            Command::Fractures { date, .. } => assert_eq!(date, "2026-03-07"),
            _ => panic!("expected fractures"),
        }
    }
}
