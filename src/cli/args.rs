//! Command-line argument parsing for EyeCheck
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::config::BackendKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// EyeCheck - Screen eye photographs for common conditions
#[derive(Parser, Debug)]
#[command(name = "eyecheck")]
#[command(version)]
#[command(about = "Score an eye photo against common eye conditions", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one eye photograph
    Analyze {
        /// PNG or JPEG image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Scoring backend: model or cloud (overrides the config file)
        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the known conditions
    Conditions,

    /// Copy the bundled model assets into the cache directory
    Provision,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default log filter for this level; `RUST_LOG` takes precedence
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "eyecheck=info,warn",
            Verbosity::VeryVerbose => "eyecheck=debug,info",
        }
    }
}
