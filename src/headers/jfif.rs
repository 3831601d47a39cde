// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::{Marker, Segment, SegmentReader, SegmentWriter};
use crate::error::{InvalidInput, Malformed, Result};
use crate::util::tracing_wrappers::*;

pub const JFIF_IDENTIFIER: &[u8; 5] = b"JFIF\0";

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, FromPrimitive)]
pub enum DensityUnits {
    /// Densities only give the pixel aspect ratio.
    #[default]
    None = 0,
    PerInch = 1,
    PerCentimeter = 2,
}

/// The APP0 segment that identifies a JFIF file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct JfifHeader {
    pub version: (u8, u8),
    pub units: DensityUnits,
    pub x_density: u16,
    pub y_density: u16,
    pub thumbnail_width: u8,
    pub thumbnail_height: u8,
    /// Packed RGB, `3 * thumbnail_width * thumbnail_height` bytes.
    pub thumbnail: Vec<u8>,
}

impl Default for JfifHeader {
    fn default() -> Self {
        JfifHeader {
            version: (1, 2),
            units: DensityUnits::None,
            x_density: 1,
            y_density: 1,
            thumbnail_width: 0,
            thumbnail_height: 0,
            thumbnail: vec![],
        }
    }
}

impl JfifHeader {
    /// Whether an APP0 payload carries the JFIF identifier rather than some
    /// other application's data.
    pub fn is_jfif(payload: &[u8]) -> bool {
        payload.starts_with(JFIF_IDENTIFIER)
    }

    fn thumbnail_len(&self) -> usize {
        3 * self.thumbnail_width as usize * self.thumbnail_height as usize
    }
}

impl Segment for JfifHeader {
    const MARKER: Marker = Marker::App0;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        if reader.read_bytes(JFIF_IDENTIFIER.len())? != JFIF_IDENTIFIER {
            return Err(Malformed::InvalidJfifIdentifier.into());
        }
        let version = (reader.read_u8()?, reader.read_u8()?);
        let units = reader.read_u8()?;
        let units = DensityUnits::from_u8(units).ok_or(Malformed::InvalidDensityUnits(units))?;
        let mut header = JfifHeader {
            version,
            units,
            x_density: reader.read_u16()?,
            y_density: reader.read_u16()?,
            thumbnail_width: reader.read_u8()?,
            thumbnail_height: reader.read_u8()?,
            thumbnail: vec![],
        };
        header.thumbnail = reader.read_bytes(header.thumbnail_len())?.to_vec();
        if !reader.is_empty() {
            // Some writers pad APP0; the padding carries nothing.
            debug!(extra = reader.remaining(), "ignoring bytes after JFIF header");
            reader.read_rest();
        }
        Ok(header)
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        if self.thumbnail.len() != self.thumbnail_len() {
            return Err(InvalidInput::ThumbnailSize(self.thumbnail.len()).into());
        }
        writer.write_bytes(JFIF_IDENTIFIER);
        writer.write_u8(self.version.0);
        writer.write_u8(self.version.1);
        writer.write_u8(self.units as u8);
        writer.write_u16(self.x_density);
        writer.write_u16(self.y_density);
        writer.write_u8(self.thumbnail_width);
        writer.write_u8(self.thumbnail_height);
        writer.write_bytes(&self.thumbnail);
        Ok(())
    }
}
