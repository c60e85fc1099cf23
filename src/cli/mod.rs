//! CLI module for azstore
//!
//! This module contains the command-line interface: command definitions,
//! argument parsing, and command execution.

pub mod commands;

pub use commands::*;
