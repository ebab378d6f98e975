use crate::parser::cursor::FieldCursor;
use crate::types::header::{AdRange, FileHeader, RecordedAt};
use crate::{AsdError, Result, Stage};
use tracing::{debug, warn};

/// Length of the header before the two variable-length text blocks.
pub const HEADER_FIXED_LEN: usize = 165;

/// Parses the file header starting at offset 0.
///
/// The header layout is as follows (all little-endian):
/// - 16 i32: version, header size, frame header size, encoding, operator name size,
///   comment size, channel 1/2 data types, frames recorded, frames current, scan
///   direction, file name, x/y pixels, x/y scan range
/// - 1 byte: averaging flag
/// - 9 i32: averaging number, year, month, day, hour, minute, second, x/y round degree
/// - 3 f32: frame acquisition time, sensor sensitivity, phase sensitivity
/// - 4 i32: booked region
/// - 3 i32: machine number, AD range code, AD resolution
/// - 6 f32: x/y max scan range, x/y/z piezo constants, z drive gain
/// - operator name and comment, lengths given above
///
/// Returns the header and the number of bytes it occupied.
pub fn parse_header(input: &[u8]) -> Result<(FileHeader, usize)> {
    let mut c = FieldCursor::new(input, 0, Stage::Header);

    let file_version = c.i32("fileVersion")?;
    let file_header_size = c.i32("fileHeaderSize")?;
    let frame_header_size = c.i32("frameHeaderSize")?;
    let enc_number = c.i32("encNumber")?;
    let operator_name_size = c.i32("operationNameSize")?;
    let comment_size = c.i32("commentSize")?;
    let data_type_ch1 = c.i32("dataTypeCh1")?;
    let data_type_ch2 = c.i32("dataTypeCh2")?;
    let number_frames_recorded = c.i32("numberFramesRecorded")?;
    let number_frames_current = c.i32("numberFramesCurrent")?;
    let scan_direction = c.i32("scanDirection")?;
    let file_name = c.i32("fileName")?;
    let x_pixel = c.i32("xPixel")?;
    let y_pixel = c.i32("yPixel")?;
    let x_scan_range = c.i32("xScanRange")?;
    let y_scan_range = c.i32("yScanRange")?;
    let avg_flag = c.flag("avgFlag")?;
    let avg_number = c.i32("avgNumber")?;
    let recorded = RecordedAt::builder()
        .year(c.i32("yearRec")?)
        .month(c.i32("monthRec")?)
        .day(c.i32("dayRec")?)
        .hour(c.i32("hourRec")?)
        .minute(c.i32("minuteRec")?)
        .second(c.i32("secondRec")?)
        .build();
    let x_round_deg = c.i32("xRoundDeg")?;
    let y_round_deg = c.i32("yRoundDeg")?;
    let frame_acq_time = c.f32("frameAcqTime")?;
    let sensor_sens = c.f32("sensorSens")?;
    let phase_sens = c.f32("phaseSens")?;
    let booked = c.i32_array::<4>("booked")?;
    let machine_num = c.i32("machineNum")?;
    let ad_range_code = c.i32("ADRange")?;
    let ad_resolution = c.i32("ADResolution")?;
    let x_max_scan_range = c.f32("xMaxScanRange")?;
    let y_max_scan_range = c.f32("yMaxScanRange")?;
    let x_piezo_constant = c.f32("xPiezoConstant")?;
    let y_piezo_constant = c.f32("yPiezoConstant")?;
    let z_piezo_constant = c.f32("zPiezoConstant")?;
    let z_drive_gain = c.f32("zDriveGain")?;
    debug_assert_eq!(c.consumed(), HEADER_FIXED_LEN);

    let operator_name = read_text(&mut c, "operatorName", operator_name_size)?;
    let comment = read_text(&mut c, "comment", comment_size)?;

    let ad_range = AdRange::from_code(ad_range_code);
    if !ad_range.is_resolved() {
        warn!(
            code = ad_range_code,
            "unknown AD range code, heights for this file cannot be calibrated"
        );
    }

    let header_len = c.consumed();
    if file_header_size as i64 != header_len as i64 {
        debug!(
            declared = file_header_size,
            actual = header_len,
            "header size field differs from decoded header length"
        );
    }
    debug!(
        version = file_version,
        x_pixel,
        y_pixel,
        frames = number_frames_current,
        "decoded ASD header"
    );

    let header = FileHeader::builder()
        .file_version(file_version)
        .file_header_size(file_header_size)
        .frame_header_size(frame_header_size)
        .enc_number(enc_number)
        .operator_name_size(operator_name_size)
        .comment_size(comment_size)
        .data_type_ch1(data_type_ch1)
        .data_type_ch2(data_type_ch2)
        .number_frames_recorded(number_frames_recorded)
        .number_frames_current(number_frames_current)
        .scan_direction(scan_direction)
        .file_name(file_name)
        .x_pixel(x_pixel)
        .y_pixel(y_pixel)
        .x_scan_range(x_scan_range)
        .y_scan_range(y_scan_range)
        .avg_flag(avg_flag)
        .avg_number(avg_number)
        .recorded(recorded)
        .x_round_deg(x_round_deg)
        .y_round_deg(y_round_deg)
        .frame_acq_time(frame_acq_time)
        .sensor_sens(sensor_sens)
        .phase_sens(phase_sens)
        .booked(booked)
        .machine_num(machine_num)
        .ad_range(ad_range)
        .ad_resolution(ad_resolution)
        .x_max_scan_range(x_max_scan_range)
        .y_max_scan_range(y_max_scan_range)
        .x_piezo_constant(x_piezo_constant)
        .y_piezo_constant(y_piezo_constant)
        .z_piezo_constant(z_piezo_constant)
        .z_drive_gain(z_drive_gain)
        .operator_name(operator_name)
        .comment(comment)
        .build();
    Ok((header, header_len))
}

fn read_text(c: &mut FieldCursor<'_>, field: &'static str, size: i32) -> Result<String> {
    let len = usize::try_from(size).map_err(|_| AsdError::InvalidFieldLength { field, value: size })?;
    let bytes = c.bytes(field, len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|source| AsdError::TextDecode { field, source })
}
