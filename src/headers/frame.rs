// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use super::{Marker, Segment, SegmentReader, SegmentWriter, tables::NUM_SLOTS};
use crate::BLOCK_DIM;
use crate::error::{Malformed, Result, Unsupported};
use crate::util::tracing_wrappers::*;

/// Baseline limit on the blocks of one interleaved MCU.
pub const MAX_BLOCKS_PER_MCU: usize = 10;
pub const MAX_SAMPLING_FACTOR: u8 = 4;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct FrameComponent {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_slot: u8,
}

impl FrameComponent {
    pub fn blocks_per_mcu(&self) -> usize {
        self.h_sampling as usize * self.v_sampling as usize
    }
}

/// SOF0: a baseline sequential frame.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FrameHeader {
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: Vec<FrameComponent>,
}

impl FrameHeader {
    pub fn max_h_sampling(&self) -> u8 {
        self.components.iter().map(|c| c.h_sampling).max().unwrap_or(1)
    }

    pub fn max_v_sampling(&self) -> u8 {
        self.components.iter().map(|c| c.v_sampling).max().unwrap_or(1)
    }

    /// Pixel size of an MCU. A single-component frame is coded
    /// non-interleaved, one block per MCU, whatever its sampling factors.
    pub fn mcu_size(&self) -> (usize, usize) {
        if self.components.len() == 1 {
            return (BLOCK_DIM, BLOCK_DIM);
        }
        (
            self.max_h_sampling() as usize * BLOCK_DIM,
            self.max_v_sampling() as usize * BLOCK_DIM,
        )
    }

    /// Number of MCUs across and down the image.
    pub fn mcu_grid(&self) -> (usize, usize) {
        let (mcu_width, mcu_height) = self.mcu_size();
        (
            (self.width as usize).div_ceil(mcu_width),
            (self.height as usize).div_ceil(mcu_height),
        )
    }

    pub fn component_index(&self, id: u8) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    fn validate(&self) -> Result<()> {
        if self.precision != 8 {
            return Err(Unsupported::SamplePrecision(self.precision).into());
        }
        if self.height == 0 {
            return Err(Unsupported::DeferredHeight.into());
        }
        if self.width == 0 {
            return Err(Malformed::InvalidDimensions(self.width, self.height).into());
        }
        if !matches!(self.components.len(), 1 | 3) {
            return Err(Unsupported::ComponentCount(self.components.len()).into());
        }
        for (i, c) in self.components.iter().enumerate() {
            let sampling = 1..=MAX_SAMPLING_FACTOR;
            if !sampling.contains(&c.h_sampling) || !sampling.contains(&c.v_sampling) {
                return Err(Malformed::InvalidSamplingFactor(c.h_sampling, c.v_sampling).into());
            }
            if c.quant_slot as usize >= NUM_SLOTS {
                return Err(Malformed::InvalidQuantSlot(c.quant_slot).into());
            }
            if self.components[..i].iter().any(|other| other.id == c.id) {
                return Err(Malformed::DuplicateComponent(c.id).into());
            }
        }
        if self.components.len() > 1 {
            let blocks: usize = self.components.iter().map(FrameComponent::blocks_per_mcu).sum();
            if blocks > MAX_BLOCKS_PER_MCU {
                return Err(Malformed::McuTooLarge(blocks).into());
            }
        }
        Ok(())
    }
}

impl Segment for FrameHeader {
    const MARKER: Marker = Marker::Sof0;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        let precision = reader.read_u8()?;
        let height = reader.read_u16()?;
        let width = reader.read_u16()?;
        let count = reader.read_u8()?;
        let mut components = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = reader.read_u8()?;
            let (h_sampling, v_sampling) = reader.read_nibbles()?;
            let quant_slot = reader.read_u8()?;
            components.push(FrameComponent {
                id,
                h_sampling,
                v_sampling,
                quant_slot,
            });
        }
        let frame = FrameHeader {
            precision,
            height,
            width,
            components,
        };
        frame.validate()?;
        debug!(?frame, "frame header");
        Ok(frame)
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        self.validate()?;
        writer.write_u8(self.precision);
        writer.write_u16(self.height);
        writer.write_u16(self.width);
        writer.write_u8(self.components.len() as u8);
        for c in &self.components {
            writer.write_u8(c.id);
            writer.write_nibbles(c.h_sampling, c.v_sampling);
            writer.write_u8(c.quant_slot);
        }
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ScanComponent {
    pub id: u8,
    pub dc_slot: u8,
    pub ac_slot: u8,
}

/// SOS header, the part before the entropy-coded data.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ScanHeader {
    pub components: Vec<ScanComponent>,
    pub spectral_start: u8,
    pub spectral_end: u8,
    pub approx_high: u8,
    pub approx_low: u8,
}

impl ScanHeader {
    /// A sequential scan over all `components`.
    pub fn sequential(components: Vec<ScanComponent>) -> ScanHeader {
        ScanHeader {
            components,
            spectral_start: 0,
            spectral_end: 63,
            approx_high: 0,
            approx_low: 0,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.components.is_empty() || self.components.len() > 4 {
            return Err(Unsupported::ComponentCount(self.components.len()).into());
        }
        for c in &self.components {
            for slot in [c.dc_slot, c.ac_slot] {
                if slot as usize >= NUM_SLOTS {
                    return Err(Malformed::InvalidHuffmanSlot(slot).into());
                }
            }
        }
        if (self.spectral_start, self.spectral_end, self.approx_high, self.approx_low)
            != (0, 63, 0, 0)
        {
            return Err(Unsupported::SpectralSelection {
                start: self.spectral_start,
                end: self.spectral_end,
                high: self.approx_high,
                low: self.approx_low,
            }
            .into());
        }
        Ok(())
    }
}

impl Segment for ScanHeader {
    const MARKER: Marker = Marker::Sos;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        let count = reader.read_u8()?;
        let mut components = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = reader.read_u8()?;
            let (dc_slot, ac_slot) = reader.read_nibbles()?;
            components.push(ScanComponent { id, dc_slot, ac_slot });
        }
        let spectral_start = reader.read_u8()?;
        let spectral_end = reader.read_u8()?;
        let (approx_high, approx_low) = reader.read_nibbles()?;
        let scan = ScanHeader {
            components,
            spectral_start,
            spectral_end,
            approx_high,
            approx_low,
        };
        scan.validate()?;
        debug!(?scan, "scan header");
        Ok(scan)
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        self.validate()?;
        writer.write_u8(self.components.len() as u8);
        for c in &self.components {
            writer.write_u8(c.id);
            writer.write_nibbles(c.dc_slot, c.ac_slot);
        }
        writer.write_u8(self.spectral_start);
        writer.write_u8(self.spectral_end);
        writer.write_nibbles(self.approx_high, self.approx_low);
        Ok(())
    }
}
