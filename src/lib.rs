//! Decoder for high-speed AFM video files (`.asd`).
//!
//! An ASD file is a fixed header followed by `numberFramesCurrent` fixed-size frame
//! records. Each record carries scalar metadata and a `y_pixel × x_pixel` grid of raw
//! 16-bit samples, which are converted to heights in nanometers.
//!
//! # Example
//!
//! ```no_run
//! use asd::{AsdFile, DecodeOptions};
//!
//! let file = AsdFile::open("sample.asd")?;
//! println!("{}", file.summary());
//!
//! // one frame without decoding the rest
//! let (record, heights) = file.height_frame(10, &DecodeOptions::default())?;
//!
//! // or the whole volume
//! let volume = file.decode_volume(&DecodeOptions::default())?;
//! assert_eq!(volume.len(), file.frame_count());
//! # Ok::<(), asd::AsdError>(())
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub mod asd_file;
pub mod parser;
pub mod processing;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

pub use asd_file::AsdFile;
pub use processing::Calibration;
pub use types::{
    AdRange, DecodeOptions, DecodedVolume, FileHeader, FrameLayout, FrameRecord, LaserFlags,
    PartialVolume, RawFrame, RecordedAt, resolve_ad_range,
};

/// Where in the file a decode error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Header,
    /// Zero-based position of the frame record in the file.
    Frame(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Header => write!(f, "header"),
            Stage::Frame(index) => write!(f, "frame {}", index),
        }
    }
}

#[derive(Error, Debug)]
pub enum AsdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Truncated input in {stage}: field '{field}' at offset {offset} needs {needed} bytes, {available} available"
    )]
    TruncatedInput {
        stage: Stage,
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid dimensions: xPixel={x_pixel}, yPixel={y_pixel}, frames={frames}")]
    InvalidDimensions {
        x_pixel: i32,
        y_pixel: i32,
        frames: i32,
    },

    #[error("Invalid length {value} for field '{field}'")]
    InvalidFieldLength { field: &'static str, value: i32 },

    #[error("Unresolved AD range code {code}")]
    UnresolvedCalibrationCode { code: i32 },

    #[error("Field '{field}' is not valid UTF-8: {source}")]
    TextDecode {
        field: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Frame {index} out of range ({count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AsdError>;
