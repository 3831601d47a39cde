// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Baseline JFIF encoding: planes, blocks, tables and the marker stream.

use crate::{
    BLOCK_DIM,
    api::{ChromaSubsampling, EncoderOptions},
    bit_writer::BitWriter,
    block::{ArrayBlockView, BlockView, EdgeExtendedView, for_each_cell},
    color::rgb_to_ycbcr_planes,
    dct::forward_dct,
    entropy_coding::{
        huffman::{ALPHABET_SIZE, CodeMap, HuffmanTable, HuffmanTree},
        run_length::ScanBlock,
    },
    error::{InvalidInput, Result},
    headers::{
        Comment, FrameComponent, FrameHeader, HuffmanTableDef, HuffmanTables, JfifHeader, Marker,
        QuantTableDef, QuantTables, ScanComponent, ScanHeader, Segment, TableClass,
        tables::check_baseline_table, write_marker,
    },
    quantizer::QuantizationTable,
    util::tracing_wrappers::*,
};

/// Table slot shared by the luma component's quantization and Huffman tables.
const LUMA: usize = 0;
/// Table slot shared by both chroma components.
const CHROMA: usize = 1;

/// One sample plane with the header fields that describe it.
struct Plane {
    id: u8,
    h_sampling: u8,
    v_sampling: u8,
    /// Huffman slot, and quantization slot when chroma has its own table.
    class: usize,
    samples: Vec<u8>,
    width: usize,
    height: usize,
}

/// Box-filters `samples` down by integer factors. Edge cells average only the
/// source pixels inside the image.
fn downsample(
    samples: &[u8],
    width: usize,
    height: usize,
    factor_x: usize,
    factor_y: usize,
) -> Result<(Vec<u8>, usize, usize)> {
    let (out_width, out_height) = (width.div_ceil(factor_x), height.div_ceil(factor_y));
    let mut out = Vec::with_capacity(out_width * out_height);
    for y in 0..out_height {
        for x in 0..out_width {
            let (x0, y0) = (x * factor_x, y * factor_y);
            let window = ArrayBlockView::window(
                samples,
                width,
                x0,
                y0,
                factor_x.min(width - x0),
                factor_y.min(height - y0),
            )?;
            let mut sum = 0;
            for_each_cell(&window, |_, _, v: u8| sum += v as usize);
            let count = window.width() * window.height();
            out.push(((sum + count / 2) / count) as u8);
        }
    }
    Ok((out, out_width, out_height))
}

fn planes(
    pixels: &[u8],
    width: usize,
    height: usize,
    subsampling: ChromaSubsampling,
) -> Result<Vec<Plane>> {
    let [y, cb, cr] = rgb_to_ycbcr_planes(pixels);
    let (h, v) = subsampling.luma_sampling();
    let mut planes = vec![Plane {
        id: 1,
        h_sampling: h,
        v_sampling: v,
        class: LUMA,
        samples: y,
        width,
        height,
    }];
    for (id, samples) in [(2, cb), (3, cr)] {
        let (samples, plane_width, plane_height) = if (h, v) == (1, 1) {
            (samples, width, height)
        } else {
            downsample(&samples, width, height, h as usize, v as usize)?
        };
        planes.push(Plane {
            id,
            h_sampling: 1,
            v_sampling: 1,
            class: CHROMA,
            samples,
            width: plane_width,
            height: plane_height,
        });
    }
    Ok(planes)
}

/// Start and size of the block window at `start` in a dimension of `len`
/// samples. Blocks past the edge reuse the last sample.
fn block_span(start: usize, len: usize) -> (usize, usize) {
    if start >= len {
        (len - 1, 1)
    } else {
        (start, BLOCK_DIM.min(len - start))
    }
}

/// DCT, quantization and run-length coding of every block, in interleaved
/// MCU order. Each block is tagged with its table class.
fn scan_blocks(
    frame: &FrameHeader,
    planes: &[Plane],
    tables: &[&QuantizationTable; 2],
) -> Result<Vec<(usize, ScanBlock)>> {
    let (mcus_x, mcus_y) = frame.mcu_grid();
    let blocks_per_mcu: usize = planes
        .iter()
        .map(|p| p.h_sampling as usize * p.v_sampling as usize)
        .sum();
    let mut blocks = Vec::with_capacity(mcus_x * mcus_y * blocks_per_mcu);
    let mut predictors = vec![0; planes.len()];
    for mcu_y in 0..mcus_y {
        for mcu_x in 0..mcus_x {
            for (plane, predictor) in planes.iter().zip(predictors.iter_mut()) {
                let (h, v) = (plane.h_sampling as usize, plane.v_sampling as usize);
                for by in 0..v {
                    for bx in 0..h {
                        let (x, width) = block_span((mcu_x * h + bx) * BLOCK_DIM, plane.width);
                        let (y, height) = block_span((mcu_y * v + by) * BLOCK_DIM, plane.height);
                        let window =
                            ArrayBlockView::window(&plane.samples, plane.width, x, y, width, height)?;
                        let block = EdgeExtendedView::new(window, BLOCK_DIM, BLOCK_DIM)?;
                        let quantized = tables[plane.class].quantize(&forward_dct(&block));
                        blocks.push((plane.class, ScanBlock::new(&quantized, predictor)?));
                    }
                }
            }
        }
    }
    Ok(blocks)
}

/// Huffman trees for one table class.
struct ClassCodes {
    dc: HuffmanTree,
    ac: HuffmanTree,
    dc_codes: CodeMap,
    ac_codes: CodeMap,
}

impl ClassCodes {
    fn build(blocks: &[(usize, ScanBlock)], class: usize) -> Result<ClassCodes> {
        let mut dc_freq = [0u64; ALPHABET_SIZE];
        let mut ac_freq = [0u64; ALPHABET_SIZE];
        for (_, block) in blocks.iter().filter(|(c, _)| *c == class) {
            dc_freq[block.dc_symbol() as usize] += 1;
            for symbol in block.ac_symbols() {
                ac_freq[symbol as usize] += 1;
            }
        }
        let dc = HuffmanTree::jpeg_from_frequencies(&dc_freq)?;
        let ac = HuffmanTree::jpeg_from_frequencies(&ac_freq)?;
        debug!(class, dc_depth = dc.depth(), ac_depth = ac.depth(), "Huffman trees");
        Ok(ClassCodes {
            dc_codes: dc.code_map()?,
            ac_codes: ac.code_map()?,
            dc,
            ac,
        })
    }

    fn table_defs(&self, slot: usize) -> Result<[HuffmanTableDef; 2]> {
        Ok([
            HuffmanTableDef {
                class: TableClass::Dc,
                slot: slot as u8,
                table: HuffmanTable::from_tree(&self.dc)?,
            },
            HuffmanTableDef {
                class: TableClass::Ac,
                slot: slot as u8,
                table: HuffmanTable::from_tree(&self.ac)?,
            },
        ])
    }
}

/// Encodes interleaved RGB `pixels` into a complete JFIF stream.
pub fn encode_image(
    pixels: &[u8],
    width: usize,
    height: usize,
    options: &EncoderOptions,
) -> Result<Vec<u8>> {
    if !(1..=u16::MAX as usize).contains(&width) || !(1..=u16::MAX as usize).contains(&height) {
        return Err(InvalidInput::Dimensions(width, height).into());
    }
    let expected = width * height * 3;
    if pixels.len() != expected {
        return Err(InvalidInput::PixelBufferSize {
            expected,
            actual: pixels.len(),
        }
        .into());
    }
    let luma_table = &options.luma_table;
    check_baseline_table(luma_table)?;
    let chroma_table = options.chroma_table.as_ref().unwrap_or(luma_table);
    check_baseline_table(chroma_table)?;
    let chroma_slot = options.chroma_table.is_some() as u8;

    let planes = planes(pixels, width, height, options.subsampling)?;
    let frame = FrameHeader {
        precision: 8,
        height: height as u16,
        width: width as u16,
        components: planes
            .iter()
            .map(|p| FrameComponent {
                id: p.id,
                h_sampling: p.h_sampling,
                v_sampling: p.v_sampling,
                quant_slot: if p.class == LUMA { 0 } else { chroma_slot },
            })
            .collect(),
    };
    let (mcus_x, mcus_y) = frame.mcu_grid();
    debug!(width, height, mcus_x, mcus_y, subsampling = ?options.subsampling, "encoding");

    let blocks = scan_blocks(&frame, &planes, &[luma_table, chroma_table])?;
    let codes = [ClassCodes::build(&blocks, LUMA)?, ClassCodes::build(&blocks, CHROMA)?];

    let mut out = vec![];
    write_marker(&mut out, Marker::Soi);
    JfifHeader {
        units: options.density.units,
        x_density: options.density.x,
        y_density: options.density.y,
        ..Default::default()
    }
    .write(&mut out)?;
    if let Some(comment) = &options.comment {
        Comment(comment.as_bytes().to_vec()).write(&mut out)?;
    }
    let mut quant = vec![QuantTableDef {
        slot: 0,
        table: *luma_table,
    }];
    if let Some(table) = &options.chroma_table {
        quant.push(QuantTableDef {
            slot: 1,
            table: *table,
        });
    }
    QuantTables(quant).write(&mut out)?;
    frame.write(&mut out)?;
    let mut huffman = vec![];
    for (slot, class) in codes.iter().enumerate() {
        huffman.extend(class.table_defs(slot)?);
    }
    HuffmanTables(huffman).write(&mut out)?;
    ScanHeader::sequential(
        planes
            .iter()
            .map(|p| ScanComponent {
                id: p.id,
                dc_slot: p.class as u8,
                ac_slot: p.class as u8,
            })
            .collect(),
    )
    .write(&mut out)?;

    let mut bw = BitWriter::new();
    for (class, block) in &blocks {
        let class = &codes[*class];
        block.write(&class.dc_codes, &class.ac_codes, &mut bw)?;
    }
    trace!(bits = bw.total_bits_written(), "entropy-coded data");
    out.extend(bw.finalize());
    write_marker(&mut out, Marker::Eoi);
    Ok(out)
}
