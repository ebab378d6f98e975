use crate::parser::{parse_frame, parse_frame_metadata, parse_header};
use crate::processing::{Calibration, calibrate_frames, height_grid};
use crate::types::{
    DecodeOptions, DecodedVolume, FileHeader, FrameLayout, FrameRecord, PartialVolume, RawFrame,
};
use crate::types::frame_layout::FRAME_HEADER_LEN;
use crate::utils::file_utils::{read_all, read_binary_file_mmap};
use crate::{AsdError, Result};
use memmap2::Mmap;
use ndarray::{Array2, Array3};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, trace};

/// A parsed ASD file with random access to its frames.
///
/// Only the header is decoded up front. Frames are decoded on request straight from
/// the underlying bytes, so reading frame `i` never touches frames `0..i`.
pub struct AsdFile<B = Mmap> {
    header: FileHeader,
    layout: FrameLayout,
    data: B,
}

impl AsdFile<Mmap> {
    /// Memory-map and parse the header of the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = read_binary_file_mmap(path)?;
        Self::from_bytes(data)
    }
}

impl AsdFile<Vec<u8>> {
    /// Read an entire stream into memory and parse its header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_bytes(read_all(reader)?)
    }
}

impl<B: AsRef<[u8]>> AsdFile<B> {
    pub fn from_bytes(data: B) -> Result<Self> {
        let (header, header_len) = parse_header(data.as_ref())?;
        let layout = FrameLayout::from_header(&header, header_len)?;

        if header.frame_header_size as i64 != FRAME_HEADER_LEN as i64 {
            debug!(
                declared = header.frame_header_size,
                actual = FRAME_HEADER_LEN,
                "frame header size field differs from record layout"
            );
        }
        debug!(
            frames_offset = layout.frames_offset,
            record_len = layout.record_len,
            frame_count = layout.frame_count,
            data_len = data.as_ref().len(),
            "computed ASD frame layout"
        );

        Ok(Self {
            header,
            layout,
            data,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Number of frames the header declares.
    pub fn frame_count(&self) -> usize {
        self.layout.frame_count
    }

    /// Bytes of frame `index`, cut short if the file ends early, plus its absolute offset.
    fn frame_bytes(&self, index: usize) -> Result<(&[u8], usize)> {
        let [start, end] = self
            .layout
            .frame_range(index)
            .ok_or(AsdError::FrameOutOfRange {
                index,
                count: self.layout.frame_count,
            })?;
        let data = self.data.as_ref();
        let start_clamped = start.min(data.len());
        let end_clamped = end.min(data.len());
        Ok((&data[start_clamped..end_clamped], start))
    }

    /// Decode frame `index` (metadata and raw samples) by direct offset.
    pub fn read_frame(&self, index: usize) -> Result<RawFrame> {
        let (bytes, origin) = self.frame_bytes(index)?;
        trace!(index, origin, "reading frame");
        parse_frame(bytes, origin, index, &self.layout)
    }

    /// Decode only the scalar metadata of frame `index`.
    pub fn read_frame_record(&self, index: usize) -> Result<FrameRecord> {
        let (bytes, origin) = self.frame_bytes(index)?;
        parse_frame_metadata(bytes, origin, index)
    }

    /// Metadata for every frame, without reading any sample blocks.
    pub fn frame_records(&self) -> Result<Vec<FrameRecord>> {
        (0..self.frame_count())
            .map(|i| self.read_frame_record(i))
            .collect()
    }

    /// Raw frames in file order.
    pub fn frames(&self) -> impl Iterator<Item = Result<RawFrame>> + '_ {
        (0..self.frame_count()).map(move |i| self.read_frame(i))
    }

    /// Calibrated, baseline-corrected heights of a single frame.
    pub fn height_frame(
        &self,
        index: usize,
        options: &DecodeOptions,
    ) -> Result<(FrameRecord, Array2<f32>)> {
        let calibration = Calibration::from_header(&self.header, options)?;
        let frame = self.read_frame(index)?;
        let heights = height_grid(frame.pixels.view(), &calibration);
        Ok((frame.record, heights))
    }

    /// Decode every frame, stopping at the first failure.
    pub fn decode_volume(&self, options: &DecodeOptions) -> Result<DecodedVolume> {
        self.decode_volume_partial(options)?.into_result()
    }

    /// Decode as many frames as possible.
    ///
    /// Errors that prevent any decoding (an unusable calibration) are returned directly.
    /// A frame that fails to decode ends the pass; the frames before it are kept in the
    /// returned volume alongside the error.
    pub fn decode_volume_partial(&self, options: &DecodeOptions) -> Result<PartialVolume> {
        let calibration = Calibration::from_header(&self.header, options)?;

        let capacity = self.layout.complete_frames(self.data.as_ref().len());
        let mut raw_frames = Vec::with_capacity(capacity);
        let mut error = None;
        for frame in self.frames() {
            match frame {
                Ok(frame) => raw_frames.push(frame),
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        let shape = (self.layout.size_y_pixels, self.layout.size_x_pixels);
        let heights = calibrate_frames(&raw_frames, shape, &calibration, options.parallel);
        let raw = options.retain_raw_pixels.then(|| {
            Array3::from_shape_fn((raw_frames.len(), shape.0, shape.1), |(f, y, x)| {
                raw_frames[f].pixels[[y, x]]
            })
        });
        let records: Vec<FrameRecord> = raw_frames.into_iter().map(|f| f.record).collect();

        info!(
            frames = records.len(),
            declared = self.layout.frame_count,
            complete = error.is_none(),
            "decoded ASD volume"
        );

        let volume = DecodedVolume::new(self.header.clone(), records, heights, raw, calibration);
        Ok(PartialVolume { volume, error })
    }

    /// Human-readable overview of the acquisition.
    pub fn summary(&self) -> String {
        let h = &self.header;
        let mut result = String::new();

        result.push_str(&format!("ASD file (version {}):\n", h.file_version));
        result.push_str(&format!(
            "  scan range (nm): {} x {}\n",
            h.x_scan_range, h.y_scan_range
        ));
        result.push_str(&format!("  pixels: {} x {}\n", h.x_pixel, h.y_pixel));
        result.push_str(&format!(
            "  frames: {} (recorded {})\n",
            h.number_frames_current, h.number_frames_recorded
        ));
        result.push_str(&format!("  recorded: {}\n", h.recorded));
        result.push_str(&format!(
            "  frame time (s): {}\n",
            f64::from(h.frame_acq_time) / 1000.0
        ));
        if let Some(last) = self
            .frame_count()
            .checked_sub(1)
            .and_then(|i| self.read_frame_record(i).ok())
        {
            let duration = match h.record_duration(last.frame_number) {
                Some(duration) => format!("{:?}", duration),
                None => "unknown".to_string(),
            };
            result.push_str(&format!("  record duration: {}\n", duration));
        }
        match h.ad_range.volts() {
            Ok(volts) => result.push_str(&format!("  AD range: {} V\n", volts)),
            Err(_) => result.push_str(&format!(
                "  AD range: unresolved code {}\n",
                h.ad_range.code()
            )),
        }
        if !h.operator_name.is_empty() {
            result.push_str(&format!("  operator: {}\n", h.operator_name));
        }
        if !h.comment.is_empty() {
            result.push_str(&format!("  comment: {}\n", h.comment));
        }

        result
    }

    /// Header, layout and per-frame metadata as pretty-printed JSON.
    pub fn metadata_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Metadata<'a> {
            header: &'a FileHeader,
            layout: &'a FrameLayout,
            frames: Vec<FrameRecord>,
        }

        let metadata = Metadata {
            header: &self.header,
            layout: &self.layout,
            frames: self.frame_records()?,
        };
        Ok(serde_json::to_string_pretty(&metadata)?)
    }
}
