//! Type definitions for the ASD file format

pub mod frame;
pub mod frame_layout;
pub mod header;
pub mod options;
pub mod volume;

// Re-export the main types for convenience
pub use frame::{FrameRecord, LaserFlags, RawFrame};
pub use frame_layout::FrameLayout;
pub use header::{AdRange, FileHeader, RecordedAt, resolve_ad_range};
pub use options::DecodeOptions;
pub use volume::{DecodedVolume, PartialVolume};
