//! CLI module for EyeCheck
//!
//! Argument parsing and terminal rendering of analysis outcomes.

pub mod args;
pub mod render;

pub use args::{Args, Commands, Verbosity};
