//! wfgen Render Engine
//!
//! Turns one diagram source into every presentation format by driving the
//! external renderer and encoder.
//!
//! # Pipeline Architecture
//!
//! ```text
//! workflow.mmd ──┬── render (transparent) ──► workflow.png ─────────────┐
//!                ├── render + CSS inject ───► workflow.svg ─────────────┤
//!                └── render × K (white) ────► frames/frame-NNN.png      │
//!                                             (+10 pause copies)        │
//!                                                  │                    │
//!                                   ┌──────────────┴─────────────┐      │
//!                                   ▼                            ▼      │
//!                         encode (libx264)        palettegen ► paletteuse
//!                                   │                            │      │
//!                                   ▼                            ▼      ▼
//!                              workflow.mp4                 workflow.gif
//!                                   └──────────────┬─────────────┘
//!                                                  ▼
//!                                       workflow-package.zip
//! ```
//!
//! The two encoders run concurrently and fail independently. When no frame
//! sequence exists the loop encoder falls back to a fade over the static
//! PNG.

pub mod context;
pub mod frames;
pub mod loop_encode;
pub mod package;
pub mod pipeline;
pub mod scratch;
pub mod static_render;
pub mod svg_animation;
pub mod video;

pub use context::StageContext;
pub use frames::{build_frames, remove_frames_dir};
pub use loop_encode::{encode_loop, LoopInput};
pub use package::package;
pub use pipeline::*;
pub use static_render::{render_raster, render_vector};
pub use video::encode_video;
