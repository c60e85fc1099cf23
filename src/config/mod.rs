//! Configuration management module
//!
//! This module handles operator settings, cloud environments, and the
//! persisted storage state record.

pub mod cloud;
pub mod record;
pub mod settings;

pub use cloud::*;
pub use record::*;
pub use settings::*;
