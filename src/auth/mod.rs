//! Authentication module for Azure services
//!
//! This module provides the credentials used to reach Azure Resource Manager,
//! either a service principal client secret or the default credential chain.

pub mod provider;

pub use provider::*;
