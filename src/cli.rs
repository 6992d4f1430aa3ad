//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - Global options and the selected [`Command`]
//! - [`Command`] - One subcommand per pipeline entry point
//! - [`DateWindow`] - `--after` / `--before` shared by the analysis commands
//!
//! ```rust
//! use chatminer::cli::{Args, Command};
//! use clap::Parser;
//!
//! let args = Args::parse_from(["chatminer", "--db", "team.db", "alerts", "Ana", "Luis"]);
//! assert!(matches!(args.command, Command::Alerts { ref names, .. } if names.len() == 2));
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::filter::MessageFilter;
use crate::error::Result;
use crate::extract::TaskStatus;
use crate::llm::Provider;
use crate::store::Id;
use crate::parsers::ExportFormat;

/// Turn chat exports into people, tasks, skills and commitments.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatminer")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatminer import export/messages.html export/messages2.html
    chatminer analyze --after 2024-01-01
    chatminer profile \"Ana Torres\"
    chatminer alerts Ana Luis
    chatminer me \"Ana Torres\"
    chatminer task 12 done
    chatminer stats")]
pub struct Args {
    /// Config file (TOML); missing file means defaults
    #[arg(short, long, global = true, default_value = "chatminer.toml")]
    pub config: PathBuf,

    /// Database file, overrides the config
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Model provider, overrides the config
    #[arg(long, global = true)]
    pub provider: Option<Provider>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Import one or more export files as one chat
    Import {
        /// Export files; merged in sorted order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Export format
        #[arg(short, long, default_value = "telegram-html")]
        format: ExportFormat,
    },

    /// Extract tasks, profile everyone and detect patterns
    Analyze {
        #[command(flatten)]
        window: DateWindow,
    },

    /// Profile one person and list their commitments
    Profile {
        /// Participant name, exactly as in the export
        name: String,

        #[command(flatten)]
        window: DateWindow,
    },

    /// Review selected people for behavior alerts
    Alerts {
        /// Participant names
        #[arg(required = true)]
        names: Vec<String>,

        #[command(flatten)]
        window: DateWindow,
    },

    /// Mark a participant as yourself
    Me {
        /// Participant name
        name: String,
    },

    /// Set the status of a stored task
    Task {
        /// Task id
        id: Id,

        /// New status (pending, in_progress, completed)
        status: TaskStatus,
    },

    /// Show what the database holds
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Date range restricting which messages are analyzed.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DateWindow {
    /// Only messages on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Only messages on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,
}

impl DateWindow {
    /// Builds the message filter for this window.
    pub fn to_filter(&self) -> Result<MessageFilter> {
        let mut filter = MessageFilter::new();
        if let Some(ref after) = self.after {
            filter = filter.with_date_from(after)?;
        }
        if let Some(ref before) = self.before {
            filter = filter.with_date_to(before)?;
        }
        Ok(filter)
    }

    /// Returns `true` if either bound is set.
    pub fn is_active(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }
}
