//! wfgen Common Utilities
//!
//! Shared infrastructure for all wfgen crates:
//! - Error types and result aliases
//! - Run clock for stage timing
//! - Tracing/logging initialization
//! - Render and generator configuration

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
