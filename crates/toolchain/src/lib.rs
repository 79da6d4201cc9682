//! wfgen Toolchain
//!
//! Everything that touches the external renderer and encoder binaries:
//! - Typed argument-list invocation with per-call timeouts
//! - Capability probing (and installing the renderer when missing)
//! - The headless-browser configuration the renderer reads

pub mod browser;
pub mod capability;
pub mod runner;

pub use browser::*;
pub use capability::*;
pub use runner::*;
