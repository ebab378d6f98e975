//! Decoded output handed to callers

use crate::AsdError;
use crate::processing::Calibration;
use crate::types::frame::FrameRecord;
use crate::types::header::FileHeader;
use itertools::{Itertools, MinMaxResult};
use ndarray::{Array3, ArrayView2, Axis};

/// Calibrated heights (nm) for every decoded frame, with the metadata they came from.
///
/// `heights` has shape `(frames, y_pixel, x_pixel)`, rows flipped relative to disk
/// and each frame shifted so its minimum is `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedVolume {
    header: FileHeader,
    frames: Vec<FrameRecord>,
    heights: Array3<f32>,
    raw: Option<Array3<u16>>,
    calibration: Calibration,
}

impl DecodedVolume {
    pub(crate) fn new(
        header: FileHeader,
        frames: Vec<FrameRecord>,
        heights: Array3<f32>,
        raw: Option<Array3<u16>>,
        calibration: Calibration,
    ) -> Self {
        debug_assert_eq!(frames.len(), heights.len_of(Axis(0)));
        Self {
            header,
            frames,
            heights,
            raw,
            calibration,
        }
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn frame_records(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn heights(&self) -> &Array3<f32> {
        &self.heights
    }

    pub fn into_heights(self) -> Array3<f32> {
        self.heights
    }

    /// Raw sample grids in on-disk row order, when retained.
    pub fn raw_pixels(&self) -> Option<&Array3<u16>> {
        self.raw.as_ref()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// False when heights were scaled with a caller-assumed AD range.
    pub fn is_calibrated(&self) -> bool {
        !self.calibration.assumed
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Height grid of frame `index`.
    pub fn frame(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        (index < self.len()).then(|| self.heights.index_axis(Axis(0), index))
    }

    /// Smallest and largest height over the whole volume.
    pub fn height_range(&self) -> Option<(f32, f32)> {
        match self.heights.iter().copied().minmax_by(f32::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(h) => Some((h, h)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }
}

/// Result of a best-effort decode: every frame read before `error` stopped the pass.
#[derive(Debug)]
pub struct PartialVolume {
    pub volume: DecodedVolume,
    pub error: Option<AsdError>,
}

impl PartialVolume {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Converts to a strict result, dropping the decoded prefix on error.
    pub fn into_result(self) -> Result<DecodedVolume, AsdError> {
        match self.error {
            None => Ok(self.volume),
            Some(err) => Err(err),
        }
    }
}
