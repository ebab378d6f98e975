//! Synthetic ASD byte streams for tests

use crate::types::frame::LASER_FLAG_COUNT;
use crate::types::header::{AdRange, FileHeader, RecordedAt};

pub struct SyntheticFrame {
    pub frame_number: i32,
    pub frame_max_data: u16,
    pub frame_min_data: u16,
    pub x_offset: u16,
    pub data_type: u16,
    pub x_tilt: f32,
    pub y_tilt: f32,
    pub laser_flags: [bool; LASER_FLAG_COUNT],
    pub pixels: Vec<u16>,
}

impl SyntheticFrame {
    pub fn new(frame_number: i32, pixels: Vec<u16>) -> Self {
        Self {
            frame_number,
            frame_max_data: pixels.iter().copied().max().unwrap_or(0),
            frame_min_data: pixels.iter().copied().min().unwrap_or(0),
            x_offset: 0,
            data_type: 0,
            x_tilt: 0.0,
            y_tilt: 0.0,
            laser_flags: [false; LASER_FLAG_COUNT],
            pixels,
        }
    }
}

pub struct SyntheticAsd {
    pub file_version: i32,
    pub x_pixel: i32,
    pub y_pixel: i32,
    pub number_frames_current: i32,
    pub x_scan_range: i32,
    pub y_scan_range: i32,
    pub recorded: RecordedAt,
    pub frame_acq_time: f32,
    pub booked: [i32; 4],
    pub ad_range_code: i32,
    pub z_piezo_constant: f32,
    pub z_drive_gain: f32,
    pub operator_name: Vec<u8>,
    pub comment: Vec<u8>,
    pub comment_size_override: Option<i32>,
    pub frames: Vec<SyntheticFrame>,
}

impl SyntheticAsd {
    pub fn new(x_pixel: i32, y_pixel: i32) -> Self {
        Self {
            file_version: 1,
            x_pixel,
            y_pixel,
            number_frames_current: 0,
            x_scan_range: 200,
            y_scan_range: 100,
            recorded: RecordedAt::builder()
                .year(2021)
                .month(3)
                .day(9)
                .hour(7)
                .minute(5)
                .second(0)
                .build(),
            frame_acq_time: 100.0,
            booked: [0; 4],
            ad_range_code: AdRange::CODE_10V,
            z_piezo_constant: 1.0,
            z_drive_gain: 1.0,
            operator_name: Vec::new(),
            comment: Vec::new(),
            comment_size_override: None,
            frames: Vec::new(),
        }
    }

    /// Appends a frame and bumps the frame count.
    pub fn push_frame(&mut self, frame: SyntheticFrame) -> &mut Self {
        self.frames.push(frame);
        self.number_frames_current += 1;
        self
    }

    fn comment_size(&self) -> i32 {
        self.comment_size_override
            .unwrap_or(self.comment.len() as i32)
    }

    fn header_len(&self) -> i32 {
        165 + self.operator_name.len() as i32 + self.comment.len() as i32
    }

    /// The header `parse_header` should produce for these bytes.
    pub fn file_header(&self) -> FileHeader {
        FileHeader::builder()
            .file_version(self.file_version)
            .file_header_size(self.header_len())
            .frame_header_size(32)
            .enc_number(0)
            .operator_name_size(self.operator_name.len() as i32)
            .comment_size(self.comment_size())
            .data_type_ch1(1)
            .data_type_ch2(2)
            .number_frames_recorded(self.number_frames_current)
            .number_frames_current(self.number_frames_current)
            .scan_direction(0)
            .file_name(0)
            .x_pixel(self.x_pixel)
            .y_pixel(self.y_pixel)
            .x_scan_range(self.x_scan_range)
            .y_scan_range(self.y_scan_range)
            .avg_flag(false)
            .avg_number(1)
            .recorded(self.recorded)
            .x_round_deg(0)
            .y_round_deg(0)
            .frame_acq_time(self.frame_acq_time)
            .sensor_sens(0.5)
            .phase_sens(0.25)
            .booked(self.booked)
            .machine_num(3)
            .ad_range(AdRange::from_code(self.ad_range_code))
            .ad_resolution(4096)
            .x_max_scan_range(1000.0)
            .y_max_scan_range(1000.0)
            .x_piezo_constant(10.0)
            .y_piezo_constant(10.0)
            .z_piezo_constant(self.z_piezo_constant)
            .z_drive_gain(self.z_drive_gain)
            .operator_name(String::from_utf8_lossy(&self.operator_name).into_owned())
            .comment(String::from_utf8_lossy(&self.comment).into_owned())
            .build()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let h = self.file_header();
        let mut out = Vec::new();
        fn i32s(out: &mut Vec<u8>, values: &[i32]) {
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        fn f32s(out: &mut Vec<u8>, values: &[f32]) {
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }

        i32s(
            &mut out,
            &[
                h.file_version,
                h.file_header_size,
                h.frame_header_size,
                h.enc_number,
                h.operator_name_size,
                h.comment_size,
                h.data_type_ch1,
                h.data_type_ch2,
                h.number_frames_recorded,
                h.number_frames_current,
                h.scan_direction,
                h.file_name,
                h.x_pixel,
                h.y_pixel,
                h.x_scan_range,
                h.y_scan_range,
            ],
        );
        out.push(h.avg_flag as u8);
        let r = h.recorded;
        i32s(
            &mut out,
            &[
                h.avg_number,
                r.year,
                r.month,
                r.day,
                r.hour,
                r.minute,
                r.second,
                h.x_round_deg,
                h.y_round_deg,
            ],
        );
        f32s(&mut out, &[h.frame_acq_time, h.sensor_sens, h.phase_sens]);
        i32s(&mut out, &h.booked);
        i32s(&mut out, &[h.machine_num, self.ad_range_code, h.ad_resolution]);
        f32s(
            &mut out,
            &[
                h.x_max_scan_range,
                h.y_max_scan_range,
                h.x_piezo_constant,
                h.y_piezo_constant,
                h.z_piezo_constant,
                h.z_drive_gain,
            ],
        );
        out.extend_from_slice(&self.operator_name);
        out.extend_from_slice(&self.comment);

        for frame in &self.frames {
            i32s(&mut out, &[frame.frame_number]);
            for v in [
                frame.frame_max_data,
                frame.frame_min_data,
                frame.x_offset,
                frame.data_type,
            ] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            f32s(&mut out, &[frame.x_tilt, frame.y_tilt]);
            out.extend(frame.laser_flags.iter().map(|&b| b as u8));
            for v in &frame.pixels {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }
}
