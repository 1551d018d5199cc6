//! Shared data models for the Relive pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Raw and processed GPS points and the finalized track
//! - Detected stops and their street-level photos
//! - Camera positions produced by the frame allocator
//! - Progress channel messages
//! - Viewer payload and video encoding settings

pub mod encoding;
pub mod frame;
pub mod progress;
pub mod stop;
pub mod track;
pub mod utils;
pub mod viewer;

// Re-export common types
pub use encoding::VideoSettings;
pub use frame::CameraPosition;
pub use progress::{ProgressMessage, ProgressStage};
pub use stop::{Stop, StopMarker, StopPhoto};
pub use track::{GpsPoint, RawPoint, Track};
pub use utils::format_time;
pub use viewer::ViewerPayload;
