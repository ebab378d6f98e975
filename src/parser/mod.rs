//! ASD file parsing functionality

pub mod cursor;
mod frame_parser;
mod header_parser;

// Re-export the parsing functions
pub use cursor::FieldCursor;
pub use frame_parser::{parse_frame, parse_frame_metadata, parse_frame_record};
pub use header_parser::{HEADER_FIXED_LEN, parse_header};
