//! CLI command definitions and handlers.

pub mod chat;
pub mod history;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Conversational assistant backend: HTTP server and local tools.
#[derive(Debug, Parser)]
#[command(name = "menubot", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Chat interactively from the terminal
    Chat {
        /// Username to chat as
        #[arg(short, long)]
        username: String,
        /// Caller location passed to the assistant
        #[arg(short, long)]
        location: Option<String>,
        /// Continue an existing session
        #[arg(short, long)]
        session: Option<Uuid>,
    },

    /// Print the turn history of a session
    History {
        /// Session id (UUID)
        session_id: Uuid,
    },
}
