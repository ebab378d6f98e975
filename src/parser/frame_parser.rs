use crate::parser::cursor::FieldCursor;
use crate::types::frame::{FrameRecord, LASER_FLAG_COUNT, LaserFlags, RawFrame};
use crate::types::frame_layout::FrameLayout;
use crate::{AsdError, Result, Stage};
use ndarray::Array2;

/// Parses the 32-byte scalar header of a frame record:
/// - 4 bytes: frame number (i32)
/// - 2 bytes each: max data, min data, x offset, data type (u16)
/// - 4 bytes each: x tilt, y tilt (f32)
/// - 12 bytes: laser flags
pub fn parse_frame_record(c: &mut FieldCursor<'_>) -> Result<FrameRecord> {
    Ok(FrameRecord::builder()
        .frame_number(c.i32("frameNumber")?)
        .frame_max_data(c.u16("frameMaxData")?)
        .frame_min_data(c.u16("frameMinData")?)
        .x_offset(c.u16("xOffset")?)
        .data_type(c.u16("dataType")?)
        .x_tilt(c.f32("xTilt")?)
        .y_tilt(c.f32("yTilt")?)
        .laser_flags(LaserFlags(c.flags::<LASER_FLAG_COUNT>("laserFlag")?))
        .build())
}

/// Parses one complete frame record (metadata plus sample block).
///
/// `input` must start at the record; `origin` is its absolute offset and is only used
/// for error reporting.
pub fn parse_frame(
    input: &[u8],
    origin: usize,
    index: usize,
    layout: &FrameLayout,
) -> Result<RawFrame> {
    let mut c = FieldCursor::new(input, origin, Stage::Frame(index));
    let record = parse_frame_record(&mut c)?;
    let samples = c.u16_block("pixels", layout.pixels_per_frame())?;
    let pixels = Array2::from_shape_vec((layout.size_y_pixels, layout.size_x_pixels), samples)
        .map_err(|_| AsdError::InvalidDimensions {
            x_pixel: layout.size_x_pixels as i32,
            y_pixel: layout.size_y_pixels as i32,
            frames: layout.frame_count as i32,
        })?;
    Ok(RawFrame { record, pixels })
}

/// Parses only the scalar metadata of a frame, leaving the sample block unread.
pub fn parse_frame_metadata(input: &[u8], origin: usize, index: usize) -> Result<FrameRecord> {
    let mut c = FieldCursor::new(input, origin, Stage::Frame(index));
    parse_frame_record(&mut c)
}
