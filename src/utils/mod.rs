//! Utility functions module
//!
//! This module contains the HTTP client setup, long-running operation
//! polling and output formatting helpers.

pub mod format;
pub mod network;
pub mod poll;

pub use format::*;
pub use network::*;
pub use poll::*;
