use crate::types::frame::RawFrame;
use crate::types::header::FileHeader;
use crate::types::options::DecodeOptions;
use crate::{AsdError, Result};
use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2, Axis, Zip, s};
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

/// Full-scale ADC code count; samples are 12-bit equivalent.
pub const ADC_FULL_SCALE: f32 = 4096.0;

/// Constants that turn a raw sample into a height in nm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    /// nm/V
    pub z_piezo_constant: f32,
    pub z_drive_gain: f32,
    pub ad_range_volts: f32,
    /// Set when `ad_range_volts` came from the caller rather than the header.
    pub assumed: bool,
}

impl Calibration {
    /// Takes the constants from the header. An unknown AD range code is an error unless
    /// `options` supplies a fallback range.
    pub fn from_header(header: &FileHeader, options: &DecodeOptions) -> Result<Self> {
        let (ad_range_volts, assumed) = match header.ad_range.volts() {
            Ok(volts) => (volts, false),
            Err(AsdError::UnresolvedCalibrationCode { code }) => {
                let Some(volts) = options.assumed_ad_range_volts else {
                    return Err(AsdError::UnresolvedCalibrationCode { code });
                };
                warn!(code, volts, "using caller-assumed AD range, heights are uncalibrated");
                (volts, true)
            }
            Err(other) => return Err(other),
        };
        Ok(Self {
            z_piezo_constant: header.z_piezo_constant,
            z_drive_gain: header.z_drive_gain,
            ad_range_volts,
            assumed,
        })
    }

    /// Height of a single raw sample before baseline removal.
    pub fn height(&self, raw: u16) -> f32 {
        -1.0 * f32::from(raw) * self.z_piezo_constant * self.z_drive_gain * self.ad_range_volts
            / ADC_FULL_SCALE
    }
}

/// Reverses row order. Applying it twice gives back the original view.
pub fn flip_rows<'a, T>(grid: ArrayView2<'a, T>) -> ArrayView2<'a, T> {
    grid.slice_move(s![..;-1, ..])
}

/// Subtracts the grid's own minimum from every value.
///
/// Returns `false` and leaves the grid untouched when the minimum is not finite, which
/// happens when the calibration constants overflow `f32`.
pub fn normalize_baseline(mut grid: ArrayViewMut2<'_, f32>) -> bool {
    if grid.is_empty() {
        return true;
    }
    let min = grid.iter().copied().fold(f32::INFINITY, f32::min);
    if !min.is_finite() {
        return false;
    }
    grid.mapv_inplace(|h| h - min);
    true
}

/// Writes the flipped, calibrated, baseline-corrected heights of `raw` into `out`.
///
/// Returns whether the baseline could be removed; see [`normalize_baseline`].
pub fn calibrate_into(
    raw: ArrayView2<'_, u16>,
    calibration: &Calibration,
    mut out: ArrayViewMut2<'_, f32>,
) -> bool {
    Zip::from(&mut out)
        .and(flip_rows(raw))
        .for_each(|h, &v| *h = calibration.height(v));
    normalize_baseline(out)
}

/// Height grid for one raw frame.
pub fn height_grid(raw: ArrayView2<'_, u16>, calibration: &Calibration) -> Array2<f32> {
    let mut out = Array2::zeros(raw.raw_dim());
    if !calibrate_into(raw, calibration, out.view_mut()) {
        warn!(?calibration, "non-finite heights, baseline not removed");
    }
    out
}

fn calibrate_frame(frame: &RawFrame, calibration: &Calibration, out: ArrayViewMut2<'_, f32>) {
    if !calibrate_into(frame.pixels.view(), calibration, out) {
        warn!(
            frame_number = frame.record.frame_number,
            ?calibration,
            "non-finite heights, baseline not removed"
        );
    }
}

/// Calibrates every frame into a `(frames, y, x)` volume.
///
/// Frames are independent, so the parallel and serial paths give the same bits.
pub fn calibrate_frames(
    frames: &[RawFrame],
    shape: (usize, usize),
    calibration: &Calibration,
    parallel: bool,
) -> Array3<f32> {
    let mut heights = Array3::zeros((frames.len(), shape.0, shape.1));
    if parallel {
        heights
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(frames.par_iter())
            .for_each(|(out, frame)| calibrate_frame(frame, calibration, out));
    } else {
        heights
            .axis_iter_mut(Axis(0))
            .zip(frames.iter())
            .for_each(|(out, frame)| calibrate_frame(frame, calibration, out));
    }
    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::frame::FrameRecord;
    use ndarray::array;

    fn unit_calibration(volts: f32) -> Calibration {
        Calibration {
            z_piezo_constant: 1.0,
            z_drive_gain: 1.0,
            ad_range_volts: volts,
            assumed: false,
        }
    }

    fn raw_frame(pixels: Array2<u16>) -> RawFrame {
        let record = FrameRecord::builder()
            .frame_number(0)
            .frame_max_data(0)
            .frame_min_data(0)
            .x_offset(0)
            .data_type(0)
            .x_tilt(0.0)
            .y_tilt(0.0)
            .build();
        RawFrame { record, pixels }
    }

    #[test]
    fn test_flip_rows_is_an_involution() {
        let grid = array![[1u16, 2, 3], [4, 5, 6], [7, 8, 9]];
        let flipped = flip_rows(grid.view());
        assert_eq!(flipped, array![[7u16, 8, 9], [4, 5, 6], [1, 2, 3]]);
        assert_eq!(flip_rows(flipped), grid.view());
    }

    #[test]
    fn test_sample_height() {
        let cal = unit_calibration(10.0);
        assert_eq!(cal.height(4096), -10.0);
        assert_eq!(cal.height(0), 0.0);
        let scaled = Calibration {
            z_piezo_constant: 2.0,
            z_drive_gain: 3.0,
            ad_range_volts: 5.0,
            assumed: false,
        };
        assert_eq!(scaled.height(2048), -15.0);
    }

    #[test]
    fn test_four_by_two_worked_example() {
        let raw = array![[0u16, 0, 0, 0], [4096, 4096, 4096, 4096]];
        let heights = height_grid(raw.view(), &unit_calibration(10.0));
        // raw row 1 (4096 -> -10 nm) lands on top and becomes the baseline
        assert_eq!(heights, array![[0.0f32, 0.0, 0.0, 0.0], [10.0, 10.0, 10.0, 10.0]]);
    }

    #[test]
    fn test_baseline_is_per_frame() {
        let frames = vec![
            raw_frame(array![[100u16, 200], [300, 400]]),
            raw_frame(array![[4000u16, 4001], [4002, 4003]]),
        ];
        let heights = calibrate_frames(&frames, (2, 2), &unit_calibration(10.0), false);
        for frame in heights.outer_iter() {
            let min = frame.iter().copied().fold(f32::INFINITY, f32::min);
            assert_eq!(min, 0.0);
        }
        // the second frame's floor is not lifted to the first frame's
        let max_second = heights
            .index_axis(Axis(0), 1)
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        assert!(max_second < 0.01);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let frames: Vec<RawFrame> = (0..8u16)
            .map(|i| raw_frame(Array2::from_shape_fn((3, 5), |(y, x)| i * 97 + (y * 5 + x) as u16 * 13)))
            .collect();
        let cal = Calibration {
            z_piezo_constant: 7.3,
            z_drive_gain: 2.1,
            ad_range_volts: 5.0,
            assumed: false,
        };
        let serial = calibrate_frames(&frames, (3, 5), &cal, false);
        let parallel = calibrate_frames(&frames, (3, 5), &cal, true);
        let bits = |a: &Array3<f32>| a.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&serial), bits(&parallel));
    }

    #[test]
    fn test_overflowing_calibration_keeps_raw_heights() {
        let cal = Calibration {
            z_piezo_constant: f32::MAX,
            z_drive_gain: f32::MAX,
            ad_range_volts: 10.0,
            assumed: false,
        };
        let raw = array![[0u16, 100]];
        let mut out = Array2::zeros(raw.raw_dim());
        assert!(!calibrate_into(raw.view(), &cal, out.view_mut()));
        assert_eq!(out[[0, 1]], f32::NEG_INFINITY);
        assert_eq!(out[[0, 0]], 0.0);

        let frames = vec![raw_frame(raw.clone()), raw_frame(array![[0u16, 0]])];
        let heights = calibrate_frames(&frames, (1, 2), &cal, true);
        assert_eq!(heights[[0, 0, 1]], f32::NEG_INFINITY);
        // a frame that stays finite is still normalized
        assert_eq!(heights.index_axis(Axis(0), 1), array![[0.0f32, 0.0]]);
    }

    #[test]
    fn test_normalize_baseline_reports_result() {
        let mut grid = array![[3.0f32, 5.0], [4.0, 9.0]];
        assert!(normalize_baseline(grid.view_mut()));
        assert_eq!(grid, array![[0.0f32, 2.0], [1.0, 6.0]]);

        let mut nan = array![[f32::NAN, 1.0]];
        // NaN is skipped by `f32::min`, so the finite values still set the floor
        assert!(normalize_baseline(nan.view_mut()));
        assert_eq!(nan[[0, 1]], 0.0);
    }

    #[test]
    fn test_empty_volume() {
        let heights = calibrate_frames(&[], (2, 3), &unit_calibration(10.0), true);
        assert_eq!(heights.shape(), &[0, 2, 3]);
    }

    #[test]
    fn test_from_header_requires_opt_in_for_unknown_range() {
        use crate::fixtures::SyntheticAsd;
        use crate::types::header::AdRange;

        let mut header = SyntheticAsd::new(2, 2).file_header();
        header.ad_range = AdRange::Unresolved(99);
        match Calibration::from_header(&header, &DecodeOptions::default()) {
            Err(AsdError::UnresolvedCalibrationCode { code }) => assert_eq!(code, 99),
            other => panic!("Expected UnresolvedCalibrationCode, got {:?}", other),
        }

        let options = DecodeOptions::builder().assumed_ad_range_volts(5.0).build();
        let cal = Calibration::from_header(&header, &options).unwrap();
        assert!(cal.assumed);
        assert_eq!(cal.ad_range_volts, 5.0);
    }
}
