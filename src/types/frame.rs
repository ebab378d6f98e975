//! Types for representing frame records in the ASD file format

use bon::Builder;
use ndarray::Array2;
use serde::Serialize;

/// Number of per-frame laser status flags.
pub const LASER_FLAG_COUNT: usize = 12;

/// Raw per-frame laser status bits, one byte each on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LaserFlags(pub [bool; LASER_FLAG_COUNT]);

impl LaserFlags {
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn count_set(&self) -> usize {
        self.0.iter().filter(|&&flag| flag).count()
    }
}

/// Scalar metadata preceding each frame's sample block (32 bytes):
/// - 4 bytes: frame number (i32)
/// - 4 × 2 bytes: max data, min data, x offset, data type (u16)
/// - 2 × 4 bytes: x tilt, y tilt (f32)
/// - 12 bytes: laser flags
#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
pub struct FrameRecord {
    /// Sequence number as written by the instrument; not necessarily zero-based.
    pub frame_number: i32,
    pub frame_max_data: u16,
    pub frame_min_data: u16,
    pub x_offset: u16,
    pub data_type: u16,
    pub x_tilt: f32,
    pub y_tilt: f32,
    #[builder(default)]
    pub laser_flags: LaserFlags,
}

/// One frame as stored: metadata plus the `(y_pixel, x_pixel)` sample grid in on-disk row order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub record: FrameRecord,
    pub pixels: Array2<u16>,
}

impl RawFrame {
    /// Smallest and largest sample actually present in the grid.
    pub fn sample_range(&self) -> Option<(u16, u16)> {
        use itertools::{Itertools, MinMaxResult};
        match self.pixels.iter().copied().minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }
}
