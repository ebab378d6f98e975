//! Types for the fixed ASD file header

use crate::{AsdError, Result};
use bon::Builder;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Full-scale voltage of the analog-to-digital converter.
///
/// The header stores this as an integer code. Codes outside the known table are kept
/// as `Unresolved` so the rest of the header can still be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdRange {
    TenVolts,
    FiveVolts,
    TwoVolts,
    Unresolved(i32),
}

impl AdRange {
    pub const CODE_10V: i32 = 1 << 18;
    pub const CODE_5V: i32 = 1 << 17;
    pub const CODE_2V: i32 = 1 << 16;

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::CODE_10V => AdRange::TenVolts,
            Self::CODE_5V => AdRange::FiveVolts,
            Self::CODE_2V => AdRange::TwoVolts,
            other => AdRange::Unresolved(other),
        }
    }

    /// The raw header code this range was decoded from.
    pub fn code(&self) -> i32 {
        match self {
            AdRange::TenVolts => Self::CODE_10V,
            AdRange::FiveVolts => Self::CODE_5V,
            AdRange::TwoVolts => Self::CODE_2V,
            AdRange::Unresolved(code) => *code,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AdRange::Unresolved(_))
    }

    /// Full-scale range in volts, or `UnresolvedCalibrationCode` for an unknown code.
    pub fn volts(&self) -> Result<f32> {
        match self {
            AdRange::TenVolts => Ok(10.0),
            AdRange::FiveVolts => Ok(5.0),
            AdRange::TwoVolts => Ok(2.0),
            AdRange::Unresolved(code) => Err(AsdError::UnresolvedCalibrationCode { code: *code }),
        }
    }
}

/// Resolves a raw AD-range header code straight to volts.
pub fn resolve_ad_range(code: i32) -> Result<f32> {
    AdRange::from_code(code).volts()
}

/// Acquisition timestamp exactly as the instrument wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Builder)]
pub struct RecordedAt {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl fmt::Display for RecordedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// The decoded file header.
///
/// Integer and float fields are kept verbatim; only the AD range is resolved into
/// a tagged value. Size fields (`file_header_size`, `frame_header_size`) are what the
/// file claims, the actual layout is computed by [`crate::FrameLayout`].
#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
pub struct FileHeader {
    pub file_version: i32,
    pub file_header_size: i32,
    pub frame_header_size: i32,
    pub enc_number: i32,
    pub operator_name_size: i32,
    pub comment_size: i32,
    pub data_type_ch1: i32,
    pub data_type_ch2: i32,
    pub number_frames_recorded: i32,
    pub number_frames_current: i32,
    pub scan_direction: i32,
    pub file_name: i32,
    pub x_pixel: i32,
    pub y_pixel: i32,
    /// nm
    pub x_scan_range: i32,
    /// nm
    pub y_scan_range: i32,
    pub avg_flag: bool,
    pub avg_number: i32,
    pub recorded: RecordedAt,
    pub x_round_deg: i32,
    pub y_round_deg: i32,
    /// Acquisition time of one frame in milliseconds.
    pub frame_acq_time: f32,
    pub sensor_sens: f32,
    pub phase_sens: f32,
    pub booked: [i32; 4],
    pub machine_num: i32,
    pub ad_range: AdRange,
    pub ad_resolution: i32,
    pub x_max_scan_range: f32,
    pub y_max_scan_range: f32,
    /// nm/V
    pub x_piezo_constant: f32,
    /// nm/V
    pub y_piezo_constant: f32,
    /// nm/V
    pub z_piezo_constant: f32,
    pub z_drive_gain: f32,
    pub operator_name: String,
    pub comment: String,
}

impl FileHeader {
    /// Duration of a single frame acquisition.
    pub fn frame_time(&self) -> Duration {
        Duration::from_nanos((f64::from(self.frame_acq_time.max(0.0)) * 1e6).round() as u64)
    }

    /// Wall-clock span covered by frames up to `last_frame_number`, or `None` when it
    /// does not fit in a `Duration`.
    pub fn record_duration(&self, last_frame_number: i32) -> Option<Duration> {
        self.frame_time().checked_mul(last_frame_number.max(0) as u32)
    }

    /// Physical size of one pixel in nm as `(x, y)`.
    pub fn pixel_size_nm(&self) -> Option<(f64, f64)> {
        if self.x_pixel <= 0 || self.y_pixel <= 0 {
            return None;
        }
        Some((
            f64::from(self.x_scan_range) / f64::from(self.x_pixel),
            f64::from(self.y_scan_range) / f64::from(self.y_pixel),
        ))
    }

    /// Sampling resolution in pixels per nm as `(x, y)`.
    pub fn pixels_per_nm(&self) -> Option<(f64, f64)> {
        if self.x_scan_range == 0 || self.y_scan_range == 0 {
            return None;
        }
        Some((
            f64::from(self.x_pixel) / f64::from(self.x_scan_range),
            f64::from(self.y_pixel) / f64::from(self.y_scan_range),
        ))
    }
}
