// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for scoring exercise attempts.
//!
//! This module contains the command-line interface logic, including argument parsing,
//! terminal logging and the command implementations.

// Modules
/// CLI arguments.
pub mod args;

/// Inspection commands (`rules`, `parse`, `catalog`).
pub mod inspect;

/// Logging macros and verbosity.
pub mod logging;

/// Scoring commands (`score`, `rank`).
pub mod score;
