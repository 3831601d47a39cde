// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::headers::DensityUnits;
use crate::quantizer::QuantizationTable;

/// Chroma resolution relative to luma, written as the sampling factors of the
/// luma component (chroma components always use 1x1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// Full-resolution chroma.
    #[default]
    Yuv444,
    /// Chroma halved horizontally.
    Yuv422,
    /// Chroma halved in both directions.
    Yuv420,
}

impl ChromaSubsampling {
    /// Horizontal and vertical sampling factors of the luma component.
    pub fn luma_sampling(self) -> (u8, u8) {
        match self {
            ChromaSubsampling::Yuv444 => (1, 1),
            ChromaSubsampling::Yuv422 => (2, 1),
            ChromaSubsampling::Yuv420 => (2, 2),
        }
    }
}

/// Pixel density written into the JFIF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub units: DensityUnits,
    pub x: u16,
    pub y: u16,
}

impl Default for Density {
    /// Square pixels, no absolute size.
    fn default() -> Self {
        Density {
            units: DensityUnits::None,
            x: 1,
            y: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    /// Table for the luma component, and for chroma when `chroma_table` is
    /// `None`. Entries must be in 1..=255.
    pub luma_table: QuantizationTable,
    pub chroma_table: Option<QuantizationTable>,
    pub subsampling: ChromaSubsampling,
    pub density: Density,
    /// Written as a COM segment after the JFIF header.
    pub comment: Option<String>,
}

impl EncoderOptions {
    /// Options using the Annex K tables scaled to `quality` (1..=100) for
    /// luma and chroma.
    pub fn with_quality(quality: u8) -> Self {
        EncoderOptions {
            luma_table: QuantizationTable::luminance(quality),
            chroma_table: Some(QuantizationTable::chrominance(quality)),
            ..Default::default()
        }
    }
}

/// Filter used to bring subsampled chroma up to the MCU size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Upsampling {
    #[default]
    Bilinear,
    /// Pixel replication. Falls back to bilinear when the sampling ratio is
    /// not an integer.
    NearestNeighbor,
}

#[derive(Debug, Clone, Default)]
pub struct DecoderOptions {
    pub upsampling: Upsampling,
}
