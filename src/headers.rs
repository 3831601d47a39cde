// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Typed records for the marker segments of a JFIF stream.

pub mod frame;
pub mod jfif;
pub mod markers;
pub mod tables;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{InvalidInput, Malformed, Result};

pub use frame::{FrameComponent, FrameHeader, ScanComponent, ScanHeader};
pub use jfif::{DensityUnits, JfifHeader};
pub use markers::{Marker, MarkerKind};
pub use tables::{
    Comment, HuffmanTableDef, HuffmanTables, QuantTableDef, QuantTables, RestartInterval,
    TableClass,
};

/// Largest payload a segment can carry after its 2-byte length field.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - 2;

/// Big-endian cursor over one segment's payload.
#[derive(Debug, Clone)]
pub struct SegmentReader<'a> {
    marker: u8,
    data: &'a [u8],
}

impl<'a> SegmentReader<'a> {
    pub fn new(marker: u8, data: &'a [u8]) -> SegmentReader<'a> {
        SegmentReader { marker, data }
    }

    pub fn marker(&self) -> u8 {
        self.marker
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.data.len() < len {
            return Err(Malformed::Truncated {
                marker: self.marker,
                needed: len - self.data.len(),
            }
            .into());
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Reads a byte split into its high and low nibbles.
    pub fn read_nibbles(&mut self) -> Result<(u8, u8)> {
        let b = self.read_u8()?;
        Ok((b >> 4, b & 0xf))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.data)
    }

    /// Fails if any payload bytes were left unread.
    pub fn finish(self) -> Result<()> {
        if !self.data.is_empty() {
            return Err(Malformed::TrailingBytes {
                marker: self.marker,
                extra: self.data.len(),
            }
            .into());
        }
        Ok(())
    }
}

/// Payload builder mirroring [`SegmentReader`].
#[derive(Debug, Default)]
pub struct SegmentWriter {
    data: Vec<u8>,
}

impl SegmentWriter {
    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_nibbles(&mut self, high: u8, low: u8) {
        debug_assert!(high < 16 && low < 16);
        self.data.push((high << 4) | low);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, v);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

/// A length-prefixed marker segment.
pub trait Segment: Sized {
    const MARKER: Marker;

    fn read(reader: &mut SegmentReader) -> Result<Self>;
    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()>;

    /// Parses a whole payload, rejecting leftover bytes.
    fn parse(payload: &[u8]) -> Result<Self> {
        let mut reader = SegmentReader::new(Self::MARKER as u8, payload);
        let segment = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(segment)
    }

    /// Appends marker, length and payload to `out`.
    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut writer = SegmentWriter::default();
        self.write_payload(&mut writer)?;
        let length = writer.data.len();
        if length > MAX_PAYLOAD {
            return Err(InvalidInput::SegmentTooLong {
                marker: Self::MARKER as u8,
                length,
            }
            .into());
        }
        write_marker(out, Self::MARKER);
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, (length + 2) as u16);
        out.extend_from_slice(&buf);
        out.extend_from_slice(&writer.data);
        Ok(())
    }
}

pub fn write_marker(out: &mut Vec<u8>, marker: Marker) {
    out.push(0xff);
    out.push(marker as u8);
}
