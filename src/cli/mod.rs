//! CLI module for arcplan
//!
//! Subcommands:
//! - `arcplan expand` - Expand a config tree into a wire-format plan
//! - `arcplan flatten` - Flatten a wire-format plan into a canonical config tree
//! - `arcplan check` - Validate a config tree and summarize it

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::ExpandOptions;
use crate::config::DocumentFormat;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "arcplan")]
#[command(about = "Convert region switch plans between config trees and the service wire format")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a config tree into a plan and print it as JSON
    Expand {
        /// Config tree (JSON or YAML)
        tree_file: PathBuf,

        /// Input format, when the extension does not tell
        #[arg(long, value_enum)]
        format: Option<DocumentFormat>,

        /// Resolve steps populating several blocks by precedence instead of failing
        #[arg(long)]
        first_match: bool,

        /// Print the update payload for the plan with this ARN instead
        #[arg(long, value_name = "ARN")]
        update: Option<String>,
    },

    /// Flatten a wire-format plan (JSON) into a canonical config tree
    Flatten {
        /// Plan as returned by the service
        plan_file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: DocumentFormat,
    },

    /// Validate a config tree and print a summary
    Check {
        /// Config tree (JSON or YAML)
        tree_file: PathBuf,

        /// Input format, when the extension does not tell
        #[arg(long, value_enum)]
        format: Option<DocumentFormat>,

        /// Resolve steps populating several blocks by precedence instead of failing
        #[arg(long)]
        first_match: bool,

        /// Earlier version of the tree; lists the changes that force replacement
        #[arg(long, value_name = "TREE_FILE")]
        previous: Option<PathBuf>,
    },
}

/// Expand options selected by the `--first-match` flag.
pub fn expand_options(first_match: bool) -> ExpandOptions {
    if first_match {
        ExpandOptions::first_match()
    } else {
        ExpandOptions::default()
    }
}
