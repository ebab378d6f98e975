use bon::Builder;

/// Settings for turning frame records into a height volume.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct DecodeOptions {
    /// Calibrate frames on the rayon pool. Output is identical either way.
    #[builder(default = true)]
    pub parallel: bool,
    /// Keep the raw sample grids on the decoded volume.
    #[builder(default)]
    pub retain_raw_pixels: bool,
    /// AD range (volts) to use when the header code is unknown. Without it such files fail
    /// with `UnresolvedCalibrationCode`; with it the volume is marked uncalibrated.
    pub assumed_ad_range_volts: Option<f32>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}
