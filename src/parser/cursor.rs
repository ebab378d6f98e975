//! Position-tracking reader over a byte slice

use crate::{AsdError, Result, Stage};
use winnow::{
    Parser,
    binary::{le_f32, le_i32, le_u16, u8 as byte},
    error::ContextError,
    token::take,
};

/// Reads fixed-width little-endian fields one after another.
///
/// Every read checks the remaining length first, so a short buffer surfaces as
/// `TruncatedInput` naming the field, stage and absolute offset.
pub struct FieldCursor<'a> {
    input: &'a [u8],
    start_len: usize,
    origin: usize,
    stage: Stage,
}

impl<'a> FieldCursor<'a> {
    /// `origin` is the absolute file offset of `input[0]`.
    pub fn new(input: &'a [u8], origin: usize, stage: Stage) -> Self {
        Self {
            input,
            start_len: input.len(),
            origin,
            stage,
        }
    }

    /// Absolute file offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.origin + self.consumed()
    }

    pub fn consumed(&self) -> usize {
        self.start_len - self.input.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.input
    }

    fn truncated(&self, field: &'static str, needed: usize) -> AsdError {
        AsdError::TruncatedInput {
            stage: self.stage,
            field,
            offset: self.offset(),
            needed,
            available: self.input.len(),
        }
    }

    fn read<O, P>(&mut self, field: &'static str, width: usize, mut parser: P) -> Result<O>
    where
        P: Parser<&'a [u8], O, ContextError>,
    {
        if self.input.len() < width {
            return Err(self.truncated(field, width));
        }
        let err = self.truncated(field, width);
        parser.parse_next(&mut self.input).map_err(|_| err)
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32> {
        self.read(field, 4, le_i32)
    }

    pub fn f32(&mut self, field: &'static str) -> Result<f32> {
        self.read(field, 4, le_f32)
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16> {
        self.read(field, 2, le_u16)
    }

    /// Single-byte boolean; any non-zero byte is `true`.
    pub fn flag(&mut self, field: &'static str) -> Result<bool> {
        self.read(field, 1, byte).map(|b| b != 0)
    }

    pub fn flags<const N: usize>(&mut self, field: &'static str) -> Result<[bool; N]> {
        let bytes = self.bytes(field, N)?;
        let mut out = [false; N];
        for (flag, &b) in out.iter_mut().zip(bytes) {
            *flag = b != 0;
        }
        Ok(out)
    }

    pub fn i32_array<const N: usize>(&mut self, field: &'static str) -> Result<[i32; N]> {
        if self.input.len() < N * 4 {
            return Err(self.truncated(field, N * 4));
        }
        let mut out = [0i32; N];
        for value in out.iter_mut() {
            *value = self.i32(field)?;
        }
        Ok(out)
    }

    pub fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        self.read(field, len, take(len))
    }

    /// `count` consecutive u16 samples read as one block.
    pub fn u16_block(&mut self, field: &'static str, count: usize) -> Result<Vec<u16>> {
        let width = count
            .checked_mul(2)
            .ok_or_else(|| self.truncated(field, usize::MAX))?;
        let block = self.bytes(field, width)?;
        Ok(block
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }
}
