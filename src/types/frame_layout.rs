use crate::types::header::FileHeader;
use crate::{AsdError, Result};
use serde::Serialize;

/// Byte length of the fixed scalar fields at the start of every frame record.
pub const FRAME_HEADER_LEN: usize = 32;

/// Byte length of one raw sample.
pub const SAMPLE_LEN: usize = 2;

/// Byte positions of the frame records, derived once from the header.
///
/// Every record has the same length for a given file, so frame `i` starts at
/// `frames_offset + i * record_len` without touching frames `0..i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameLayout {
    pub frames_offset: usize,
    pub record_len: usize,
    pub frame_count: usize,
    pub size_x_pixels: usize,
    pub size_y_pixels: usize,
}

impl FrameLayout {
    /// Validates the header dimensions and computes the layout.
    ///
    /// `header_len` is the number of bytes the header actually occupied.
    pub fn from_header(header: &FileHeader, header_len: usize) -> Result<Self> {
        let invalid = || AsdError::InvalidDimensions {
            x_pixel: header.x_pixel,
            y_pixel: header.y_pixel,
            frames: header.number_frames_current,
        };
        if header.x_pixel <= 0 || header.y_pixel <= 0 || header.number_frames_current < 0 {
            return Err(invalid());
        }

        let size_x = header.x_pixel as usize;
        let size_y = header.y_pixel as usize;
        let record_len = size_x
            .checked_mul(size_y)
            .and_then(|n| n.checked_mul(SAMPLE_LEN))
            .and_then(|n| n.checked_add(FRAME_HEADER_LEN))
            .ok_or_else(invalid)?;

        Ok(Self {
            frames_offset: header_len,
            record_len,
            frame_count: header.number_frames_current as usize,
            size_x_pixels: size_x,
            size_y_pixels: size_y,
        })
    }

    pub fn pixels_per_frame(&self) -> usize {
        self.size_x_pixels * self.size_y_pixels
    }

    /// Start offset of frame `frame`, or `None` past the last frame.
    pub fn frame_offset(&self, frame: usize) -> Option<usize> {
        if frame >= self.frame_count {
            return None;
        }
        frame
            .checked_mul(self.record_len)
            .and_then(|n| n.checked_add(self.frames_offset))
    }

    /// `[start, end)` byte range of frame `frame`.
    pub fn frame_range(&self, frame: usize) -> Option<[usize; 2]> {
        let start = self.frame_offset(frame)?;
        Some([start, start.checked_add(self.record_len)?])
    }

    /// Total file length the header promises.
    pub fn expected_len(&self) -> Option<usize> {
        self.frame_count
            .checked_mul(self.record_len)
            .and_then(|n| n.checked_add(self.frames_offset))
    }

    /// Number of complete frame records present in a buffer of `data_len` bytes.
    pub fn complete_frames(&self, data_len: usize) -> usize {
        let available = data_len.saturating_sub(self.frames_offset) / self.record_len;
        available.min(self.frame_count)
    }
}
