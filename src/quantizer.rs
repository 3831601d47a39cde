// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    BLOCK_DIM, BLOCK_SIZE,
    block::{BlockData, BlockView},
    coeff_order::ZIGZAG_TO_NATURAL,
    error::{InvalidInput, Result},
};

/// ITU-T T.81 Table K.1.
const LUMINANCE_BASE: [u16; BLOCK_SIZE] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99, //
];

/// ITU-T T.81 Table K.2.
const CHROMINANCE_BASE: [u16; BLOCK_SIZE] = [
    17, 18, 24, 47, 99, 99, 99, 99, //
    18, 21, 26, 66, 99, 99, 99, 99, //
    24, 26, 56, 99, 99, 99, 99, 99, //
    47, 66, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
];

/// 64 divisors in natural (row-major) order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantizationTable {
    values: [u16; BLOCK_SIZE],
}

impl Default for QuantizationTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl QuantizationTable {
    /// A mild table growing with frequency, used when the caller has no
    /// preference.
    pub const DEFAULT: QuantizationTable = QuantizationTable {
        values: [
            8, 16, 16, 18, 24, 32, 32, 48, //
            16, 16, 16, 18, 24, 32, 48, 56, //
            16, 16, 18, 24, 32, 48, 56, 64, //
            16, 18, 24, 32, 48, 56, 64, 64, //
            18, 24, 32, 48, 56, 64, 64, 64, //
            24, 32, 48, 56, 64, 64, 64, 64, //
            32, 48, 56, 64, 64, 64, 64, 64, //
            48, 56, 64, 64, 64, 64, 64, 64, //
        ],
    };

    /// Every divisor is 1.
    pub const UNIT: QuantizationTable = QuantizationTable {
        values: [1; BLOCK_SIZE],
    };

    pub fn new(values: [u16; BLOCK_SIZE]) -> Result<QuantizationTable> {
        if let Some(&zero) = values.iter().find(|&&v| v == 0) {
            return Err(InvalidInput::QuantEntry(zero).into());
        }
        Ok(QuantizationTable { values })
    }

    /// Builds a table from its wire (zigzag) order.
    pub fn from_zigzag(zigzag: &[u16; BLOCK_SIZE]) -> Result<QuantizationTable> {
        let mut values = [0; BLOCK_SIZE];
        for (k, &v) in zigzag.iter().enumerate() {
            values[ZIGZAG_TO_NATURAL[k]] = v;
        }
        Self::new(values)
    }

    pub fn to_zigzag(&self) -> [u16; BLOCK_SIZE] {
        array_init::array_init(|k| self.values[ZIGZAG_TO_NATURAL[k]])
    }

    /// Annex K luminance table scaled to an IJG quality in 1..=100.
    pub fn luminance(quality: u8) -> QuantizationTable {
        Self::scaled(&LUMINANCE_BASE, quality)
    }

    /// Annex K chrominance table scaled to an IJG quality in 1..=100.
    pub fn chrominance(quality: u8) -> QuantizationTable {
        Self::scaled(&CHROMINANCE_BASE, quality)
    }

    fn scaled(base: &[u16; BLOCK_SIZE], quality: u8) -> QuantizationTable {
        let quality = quality.clamp(1, 100) as u32;
        let scale = if quality < 50 {
            5000 / quality
        } else {
            200 - quality * 2
        };
        QuantizationTable {
            values: array_init::array_init(|i| {
                ((base[i] as u32 * scale + 50) / 100).clamp(1, 255) as u16
            }),
        }
    }

    pub fn values(&self) -> &[u16; BLOCK_SIZE] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.values[row * BLOCK_DIM + col]
    }

    /// Whether every entry fits the 8-bit DQT precision baseline requires.
    pub fn is_8bit(&self) -> bool {
        self.values.iter().all(|&v| v <= 255)
    }

    /// `round(coefficient / divisor)`, rounding half away from zero.
    pub fn quantize<V: BlockView<f32> + ?Sized>(&self, coefficients: &V) -> BlockData<i32> {
        BlockData::from_fn(BLOCK_DIM, BLOCK_DIM, |row, col| {
            (coefficients.get(row, col) / self.get(row, col) as f32).round() as i32
        })
    }

    pub fn dequantize<V: BlockView<i32> + ?Sized>(&self, coefficients: &V) -> BlockData<i32> {
        BlockData::from_fn(BLOCK_DIM, BLOCK_DIM, |row, col| {
            coefficients.get(row, col).saturating_mul(self.get(row, col) as i32)
        })
    }
}
