// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Zigzag run-length representation of quantized blocks and the
//! signed-magnitude bit coding shared by DC differences and AC values.

use crate::{
    BLOCK_DIM, BLOCK_SIZE,
    bit_reader::BitReader,
    bit_writer::BitWriter,
    block::{BlockData, BlockView, ZeroPaddedView},
    coeff_order::ZIGZAG_TO_NATURAL,
    entropy_coding::huffman::{CodeMap, HuffmanTree},
    error::{Internal, Malformed, Result},
    util::tracing_wrappers::*,
};

/// Largest magnitude category of a DC difference for 8-bit samples.
pub const MAX_DC_CATEGORY: u8 = 11;
/// Largest DC magnitude an 8-bit frame can carry.
pub const MAX_DC_VALUE: i32 = (1 << MAX_DC_CATEGORY) - 1;
/// Largest magnitude category of an AC coefficient for 8-bit samples.
pub const MAX_AC_CATEGORY: u8 = 10;

/// Longest zero run a single op can carry.
const MAX_RUN: u8 = 15;

/// Bit length of `|value|`.
pub fn category(value: i32) -> u8 {
    (u32::BITS - value.unsigned_abs().leading_zeros()) as u8
}

/// Splits `value` into its magnitude category and the raw bits stored after
/// the Huffman symbol. Negative values are stored as `value - 1` within the
/// category width, so their top bit is always 0.
pub fn expand(value: i32) -> (u8, u32) {
    let length = category(value);
    let bits = if value < 0 {
        (value as i64 + (1i64 << length) - 1) as u32
    } else {
        value as u32
    };
    (length, bits)
}

/// Inverse of [`expand`].
pub fn collapse(bits: u32, length: u8) -> i32 {
    if length == 0 {
        return 0;
    }
    if (bits >> (length - 1)) & 1 == 0 {
        (bits as i64 - ((1i64 << length) - 1)) as i32
    } else {
        bits as i32
    }
}

/// One AC symbol: a non-zero value preceded by `leading_zeros` zero
/// coefficients in zigzag order.
///
/// `(0, 0)` is the end-of-block marker and `(15, 0)` stands for sixteen zeros.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOp {
    pub leading_zeros: u8,
    pub value: i32,
}

impl EncodeOp {
    pub const END_OF_BLOCK: EncodeOp = EncodeOp {
        leading_zeros: 0,
        value: 0,
    };
    pub const ZERO_RUN: EncodeOp = EncodeOp {
        leading_zeros: MAX_RUN,
        value: 0,
    };

    pub fn new(leading_zeros: u8, value: i32) -> EncodeOp {
        debug_assert!(leading_zeros <= MAX_RUN);
        EncodeOp {
            leading_zeros,
            value,
        }
    }

    /// Huffman symbol: run length in the high nibble, category in the low one.
    pub fn symbol(&self) -> u8 {
        (self.leading_zeros << 4) | (category(self.value) & 0xf)
    }

    /// The symbol and the low byte of the magnitude bits.
    pub fn to_bytes(&self) -> (u8, u8) {
        let (_, bits) = expand(self.value);
        (self.symbol(), bits as u8)
    }

    fn check_range(&self) -> Result<()> {
        if category(self.value) > MAX_AC_CATEGORY {
            return Err(Internal::CoefficientOutOfRange {
                kind: "AC",
                value: self.value,
                max: MAX_AC_CATEGORY,
            }
            .into());
        }
        Ok(())
    }

    pub fn write(&self, codes: &CodeMap, bw: &mut BitWriter) -> Result<()> {
        self.check_range()?;
        write_symbol(self.symbol(), codes, bw)?;
        let (length, bits) = expand(self.value);
        bw.write(bits, length as usize);
        Ok(())
    }
}

fn write_symbol(symbol: u8, codes: &CodeMap, bw: &mut BitWriter) -> Result<()> {
    let code = codes.get(symbol)?;
    bw.write(code.bits, code.length as usize);
    Ok(())
}

/// Zigzag coefficient `k` of an 8x8 block.
fn zigzag_get<V: BlockView<i32> + ?Sized>(block: &V, k: usize) -> i32 {
    let natural = ZIGZAG_TO_NATURAL[k];
    block.get(natural / BLOCK_DIM, natural % BLOCK_DIM)
}

/// Run-length codes the AC coefficients of `block`. Undersized blocks are
/// treated as zero beyond their bounds.
pub fn run_length_encode<V: BlockView<i32>>(block: &V) -> Result<Vec<EncodeOp>> {
    let block = ZeroPaddedView::new(block, BLOCK_DIM, BLOCK_DIM);
    let last_nonzero = (1..BLOCK_SIZE)
        .rev()
        .find(|&k| zigzag_get(&block, k) != 0)
        .unwrap_or(0);
    let mut ops = vec![];
    let mut zeros = 0;
    for k in 1..=last_nonzero {
        let value = zigzag_get(&block, k);
        if value == 0 {
            zeros += 1;
            if zeros == MAX_RUN + 1 {
                ops.push(EncodeOp::ZERO_RUN);
                zeros = 0;
            }
        } else {
            let op = EncodeOp::new(zeros, value);
            op.check_range()?;
            ops.push(op);
            zeros = 0;
        }
    }
    if last_nonzero < BLOCK_SIZE - 1 {
        ops.push(EncodeOp::END_OF_BLOCK);
    }
    Ok(ops)
}

/// Huffman symbol of a DC difference.
pub fn dc_symbol(diff: i32) -> Result<u8> {
    let length = category(diff);
    if length > MAX_DC_CATEGORY {
        return Err(Internal::CoefficientOutOfRange {
            kind: "DC",
            value: diff,
            max: MAX_DC_CATEGORY,
        }
        .into());
    }
    Ok(length)
}

pub fn write_dc(diff: i32, codes: &CodeMap, bw: &mut BitWriter) -> Result<()> {
    write_symbol(dc_symbol(diff)?, codes, bw)?;
    let (length, bits) = expand(diff);
    bw.write(bits, length as usize);
    Ok(())
}

fn read_magnitude(br: &mut BitReader, length: u8) -> Result<i32> {
    let bits = br.read(length as usize)? as u32;
    Ok(collapse(bits, length))
}

pub fn read_dc(br: &mut BitReader, tree: &HuffmanTree) -> Result<i32> {
    let length = tree.read_symbol(br)?;
    if length > MAX_DC_CATEGORY {
        return Err(Malformed::InvalidCategory(length).into());
    }
    read_magnitude(br, length)
}

/// Reads AC symbols into `zigzag[1..]` until end-of-block or the block is
/// full. Cells that are not written keep their previous value.
pub fn read_ac(br: &mut BitReader, tree: &HuffmanTree, zigzag: &mut [i32; BLOCK_SIZE]) -> Result<()> {
    let mut k = 1;
    while k < BLOCK_SIZE {
        let symbol = tree.read_symbol(br)?;
        let run = (symbol >> 4) as usize;
        let length = symbol & 0xf;
        if length == 0 {
            match run {
                0 => break,
                15 => {
                    k += 16;
                    if k > BLOCK_SIZE {
                        return Err(Malformed::CoefficientOverflow(k).into());
                    }
                    continue;
                }
                _ => return Err(Malformed::InvalidCategory(symbol).into()),
            }
        }
        if length > MAX_AC_CATEGORY {
            return Err(Malformed::InvalidCategory(symbol).into());
        }
        k += run;
        if k >= BLOCK_SIZE {
            return Err(Malformed::CoefficientOverflow(k).into());
        }
        zigzag[k] = read_magnitude(br, length)?;
        k += 1;
    }
    Ok(())
}

/// A quantized block ready for entropy coding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanBlock {
    pub dc_diff: i32,
    pub ops: Vec<EncodeOp>,
}

impl ScanBlock {
    /// Splits `block` into a DC difference against `predictor` and AC ops, and
    /// advances the predictor.
    pub fn new<V: BlockView<i32>>(block: &V, predictor: &mut i32) -> Result<ScanBlock> {
        let dc = block.get(0, 0);
        let dc_diff = dc - *predictor;
        dc_symbol(dc_diff)?;
        *predictor = dc;
        Ok(ScanBlock {
            dc_diff,
            ops: run_length_encode(block)?,
        })
    }

    pub fn dc_symbol(&self) -> u8 {
        category(self.dc_diff)
    }

    pub fn ac_symbols(&self) -> impl Iterator<Item = u8> + '_ {
        self.ops.iter().map(EncodeOp::symbol)
    }

    pub fn write(&self, dc_codes: &CodeMap, ac_codes: &CodeMap, bw: &mut BitWriter) -> Result<()> {
        write_dc(self.dc_diff, dc_codes, bw)?;
        for op in &self.ops {
            op.write(ac_codes, bw)?;
        }
        Ok(())
    }
}

/// Decodes one block's coefficients into natural order, advancing the DC
/// predictor.
pub fn read_block(
    br: &mut BitReader,
    dc_tree: &HuffmanTree,
    ac_tree: &HuffmanTree,
    predictor: &mut i32,
) -> Result<BlockData<i32>> {
    let mut zigzag = [0; BLOCK_SIZE];
    let diff = read_dc(br, dc_tree)?;
    let dc = *predictor as i64 + diff as i64;
    if dc.abs() > MAX_DC_VALUE as i64 {
        return Err(Malformed::DcOutOfRange(dc).into());
    }
    *predictor = dc as i32;
    zigzag[0] = *predictor;
    read_ac(br, ac_tree, &mut zigzag)?;
    trace!(dc = zigzag[0], "decoded block");
    let mut natural = vec![0; BLOCK_SIZE];
    for (k, &value) in zigzag.iter().enumerate() {
        natural[ZIGZAG_TO_NATURAL[k]] = value;
    }
    BlockData::from_vec(BLOCK_DIM, BLOCK_DIM, natural)
}
