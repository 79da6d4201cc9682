//! wfgen Artifact Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Source:** the opaque diagram text, read once per run
//! - **Reveal script:** the ordered progressive-reveal steps
//! - **Frames:** the immutable, fully materialized frame sequence
//! - **Artifacts:** named outputs keyed by kind
//!
//! Artifacts carry no identity beyond kind and location. A stage either
//! yields a verified artifact or an error.

pub mod artifact;
pub mod frames;
pub mod reveal;
pub mod source;

pub use artifact::*;
pub use frames::*;
pub use reveal::*;
pub use source::*;
