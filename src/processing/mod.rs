//! Raw sample to height conversion

pub mod calibration;

// Re-export for easier access
pub use calibration::{
    ADC_FULL_SCALE, Calibration, calibrate_frames, calibrate_into, flip_rows, height_grid,
    normalize_baseline,
};
