// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Marker-driven decoding of a baseline JFIF stream.

use byteorder::{BigEndian, ByteOrder};

use crate::{
    api::{DecodedImage, DecoderOptions, Upsampling},
    bit_reader::BitReader,
    block::{BilinearView, BlockData, BlockView, CompositeView, NearestNeighborView},
    color::ycbcr_f32_to_rgb,
    dct::inverse_dct,
    entropy_coding::{huffman::HuffmanTree, run_length::read_block},
    error::{Malformed, Result, Unsupported},
    headers::{
        Comment, FrameHeader, HuffmanTables, JfifHeader, Marker, MarkerKind, QuantTables,
        RestartInterval, ScanHeader, Segment, TableClass, markers::is_standalone,
        tables::NUM_SLOTS,
    },
    quantizer::QuantizationTable,
    util::tracing_wrappers::*,
};

/// Tables and headers collected from the segments seen so far.
#[derive(Debug, Default)]
struct TableSet {
    quant: [Option<QuantizationTable>; NUM_SLOTS],
    dc: [Option<HuffmanTree>; NUM_SLOTS],
    ac: [Option<HuffmanTree>; NUM_SLOTS],
}

/// Everything a scan needs to decode one component.
struct ComponentPlan<'t> {
    /// Position in the frame's component list.
    frame_index: usize,
    id: u8,
    h_blocks: usize,
    v_blocks: usize,
    quant: &'t QuantizationTable,
    dc: &'t HuffmanTree,
    ac: &'t HuffmanTree,
}

fn huffman_tree(
    slots: &[Option<HuffmanTree>; NUM_SLOTS],
    class: TableClass,
    slot: u8,
) -> Result<&HuffmanTree> {
    let tree = slots[slot as usize]
        .as_ref()
        .ok_or(Malformed::MissingHuffmanTable {
            class: class.name(),
            slot,
        })?;
    Ok(tree)
}

pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    options: DecoderOptions,
    tables: TableSet,
    frame: Option<FrameHeader>,
    pixels: Option<Vec<u8>>,
    jfif: Option<JfifHeader>,
    comments: Vec<Comment>,
    restart_interval: Option<u16>,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], options: DecoderOptions) -> Decoder<'a> {
        Decoder {
            data,
            pos: 0,
            options,
            tables: TableSet::default(),
            frame: None,
            pixels: None,
            jfif: None,
            comments: vec![],
            restart_interval: None,
        }
    }

    /// Runs the marker loop from SOI to EOI.
    pub fn decode(mut self) -> Result<DecodedImage> {
        if !self.data.starts_with(&[0xff, Marker::Soi as u8]) {
            return Err(Malformed::MissingSoi.into());
        }
        self.pos = 2;
        loop {
            let code = self.next_marker()?;
            if code == Marker::Eoi as u8 {
                break;
            }
            self.handle_marker(code)?;
        }
        if self.pos < self.data.len() {
            debug!(extra = self.data.len() - self.pos, "ignoring bytes after EOI");
        }
        let (Some(frame), Some(pixels)) = (self.frame, self.pixels) else {
            return Err(Malformed::MissingScan.into());
        };
        Ok(DecodedImage {
            width: frame.width as usize,
            height: frame.height as usize,
            pixels,
            jfif: self.jfif,
            comments: self.comments,
            restart_interval: self.restart_interval,
            components: frame.components.len(),
        })
    }

    /// Reads `0xFF <code>`, skipping fill bytes.
    fn next_marker(&mut self) -> Result<u8> {
        match self.data.get(self.pos) {
            None => return Err(Malformed::MissingEoi.into()),
            Some(0xff) => {}
            Some(&found) => {
                return Err(Malformed::ExpectedMarker {
                    offset: self.pos,
                    found,
                }
                .into());
            }
        }
        while self.data.get(self.pos) == Some(&0xff) {
            self.pos += 1;
        }
        let code = *self.data.get(self.pos).ok_or(Malformed::MissingEoi)?;
        self.pos += 1;
        Ok(code)
    }

    /// Returns the payload of the segment starting at the current position.
    fn segment_payload(&mut self, code: u8) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        if rest.len() < 2 {
            return Err(Malformed::Truncated {
                marker: code,
                needed: 2 - rest.len(),
            }
            .into());
        }
        let length = BigEndian::read_u16(rest);
        if length < 2 {
            return Err(Malformed::SegmentTooShort {
                marker: code,
                length,
            }
            .into());
        }
        let length = length as usize;
        if rest.len() < length {
            return Err(Malformed::Truncated {
                marker: code,
                needed: length - rest.len(),
            }
            .into());
        }
        self.pos += length;
        trace!(code, length, "segment");
        Ok(&rest[2..length])
    }

    #[instrument(level = "debug", skip(self))]
    fn handle_marker(&mut self, code: u8) -> Result<()> {
        let kind = MarkerKind::classify(code);
        match kind {
            MarkerKind::Restart(n) => return Err(Unsupported::RestartMarker(n).into()),
            MarkerKind::UnsupportedFrame(code) => {
                return Err(Unsupported::FrameType(code - Marker::Sof0 as u8).into());
            }
            MarkerKind::Known(Marker::Dnl | Marker::Dhp | Marker::Exp) => {
                return Err(Unsupported::HierarchicalMarker(code).into());
            }
            _ if is_standalone(code) => {
                warn!("ignoring stray standalone marker");
                return Ok(());
            }
            _ => {}
        }
        let payload = self.segment_payload(code)?;
        match kind {
            MarkerKind::Known(Marker::App0) if JfifHeader::is_jfif(payload) => {
                if self.jfif.is_none() {
                    self.jfif = Some(JfifHeader::parse(payload)?);
                } else {
                    debug!("ignoring repeated JFIF header");
                }
            }
            MarkerKind::Known(Marker::Dqt) => {
                for def in QuantTables::parse(payload)?.0 {
                    self.tables.quant[def.slot as usize] = Some(def.table);
                }
            }
            MarkerKind::Known(Marker::Dht) => {
                for def in HuffmanTables::parse(payload)?.0 {
                    let tree = def.table.to_tree()?;
                    let slots = match def.class {
                        TableClass::Dc => &mut self.tables.dc,
                        TableClass::Ac => &mut self.tables.ac,
                    };
                    slots[def.slot as usize] = Some(tree);
                }
            }
            MarkerKind::Known(Marker::Dri) => {
                let RestartInterval(interval) = RestartInterval::parse(payload)?;
                self.restart_interval = Some(interval);
            }
            MarkerKind::Known(Marker::Com) => self.comments.push(Comment::parse(payload)?),
            MarkerKind::Known(Marker::Sof0) => {
                if self.frame.is_some() {
                    return Err(Unsupported::MultipleFrames.into());
                }
                self.frame = Some(FrameHeader::parse(payload)?);
            }
            MarkerKind::Known(Marker::Sos) => {
                if self.pixels.is_some() {
                    return Err(Unsupported::MultipleScans.into());
                }
                let scan = ScanHeader::parse(payload)?;
                let entropy = self.read_entropy_data()?;
                self.pixels = Some(self.decode_scan(&scan, &entropy)?);
            }
            _ => debug!(len = payload.len(), "skipping segment"),
        }
        Ok(())
    }

    /// Collects entropy-coded bytes up to the next marker, undoing byte
    /// stuffing.
    fn read_entropy_data(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.data.len() - self.pos);
        while let Some(&b) = self.data.get(self.pos) {
            if b != 0xff {
                out.push(b);
                self.pos += 1;
                continue;
            }
            let mut next = self.pos + 1;
            while self.data.get(next) == Some(&0xff) {
                next += 1;
            }
            match self.data.get(next) {
                Some(0x00) => {
                    out.push(0xff);
                    self.pos = next + 1;
                }
                Some(&code @ 0xd0..=0xd7) => {
                    return Err(Unsupported::RestartMarker(code - 0xd0).into());
                }
                _ => break,
            }
        }
        debug!(bytes = out.len(), "entropy-coded data");
        Ok(out)
    }

    fn plan_components(&self, frame: &FrameHeader, scan: &ScanHeader) -> Result<Vec<ComponentPlan<'_>>> {
        if scan.components.len() != frame.components.len() {
            return Err(Unsupported::PartialScan {
                scan: scan.components.len(),
                frame: frame.components.len(),
            }
            .into());
        }
        let interleaved = scan.components.len() > 1;
        let mut plans: Vec<ComponentPlan> = Vec::with_capacity(scan.components.len());
        for sc in &scan.components {
            let frame_index = frame
                .component_index(sc.id)
                .ok_or(Malformed::UnknownComponent(sc.id))?;
            if plans.iter().any(|p| p.frame_index == frame_index) {
                return Err(Malformed::DuplicateComponent(sc.id).into());
            }
            let fc = &frame.components[frame_index];
            let quant = self.tables.quant[fc.quant_slot as usize]
                .as_ref()
                .ok_or(Malformed::MissingQuantTable {
                    component: fc.id,
                    slot: fc.quant_slot,
                })?;
            let dc = huffman_tree(&self.tables.dc, TableClass::Dc, sc.dc_slot)?;
            let ac = huffman_tree(&self.tables.ac, TableClass::Ac, sc.ac_slot)?;
            let (h_blocks, v_blocks) = if interleaved {
                (fc.h_sampling as usize, fc.v_sampling as usize)
            } else {
                (1, 1)
            };
            plans.push(ComponentPlan {
                frame_index,
                id: fc.id,
                h_blocks,
                v_blocks,
                quant,
                dc,
                ac,
            });
        }
        Ok(plans)
    }

    /// Brings one component's blocks up to the MCU's pixel size.
    fn assemble(
        &self,
        tiles: Vec<BlockData<f32>>,
        across: usize,
        (mcu_width, mcu_height): (usize, usize),
    ) -> Result<Box<dyn BlockView<f32>>> {
        let composite = CompositeView::new(tiles, across)?;
        let (width, height) = (composite.width(), composite.height());
        if (width, height) == (mcu_width, mcu_height) {
            return Ok(Box::new(composite));
        }
        let integer_ratio = mcu_width % width == 0 && mcu_height % height == 0;
        if self.options.upsampling == Upsampling::NearestNeighbor && integer_ratio {
            Ok(Box::new(NearestNeighborView::new::<f32>(
                composite, mcu_width, mcu_height,
            )?))
        } else {
            Ok(Box::new(BilinearView::<_, f32>::new(
                composite, mcu_width, mcu_height,
            )?))
        }
    }

    fn decode_scan(&self, scan: &ScanHeader, entropy: &[u8]) -> Result<Vec<u8>> {
        let frame = self.frame.as_ref().ok_or(Malformed::ScanBeforeFrame)?;
        let plans = self.plan_components(frame, scan)?;
        let (width, height) = (frame.width as usize, frame.height as usize);
        let mcu_size @ (mcu_width, mcu_height) = frame.mcu_size();
        let (mcus_x, mcus_y) = frame.mcu_grid();
        debug!(mcus_x, mcus_y, mcu_width, mcu_height, "decoding scan");

        let mut br = BitReader::new(entropy);
        let mut predictors = vec![0i32; plans.len()];
        let mut pixels = vec![0u8; width * height * 3];
        let mut views: Vec<Option<Box<dyn BlockView<f32>>>> =
            (0..frame.components.len()).map(|_| None).collect();
        for mcu_y in 0..mcus_y {
            for mcu_x in 0..mcus_x {
                for (plan, predictor) in plans.iter().zip(predictors.iter_mut()) {
                    let mut tiles = Vec::with_capacity(plan.h_blocks * plan.v_blocks);
                    for block in 0..plan.h_blocks * plan.v_blocks {
                        let coefficients = read_block(&mut br, plan.dc, plan.ac, predictor)
                            .map_err(|e| Malformed::Block {
                                mcu: mcu_y * mcus_x + mcu_x,
                                component: plan.id,
                                block,
                                source: Box::new(e),
                            })?;
                        let dequantized = plan.quant.dequantize(&coefficients);
                        tiles.push(inverse_dct(&dequantized));
                    }
                    views[plan.frame_index] = Some(self.assemble(tiles, plan.h_blocks, mcu_size)?);
                }
                let planes: Vec<&dyn BlockView<f32>> =
                    views.iter().flatten().map(|v| &**v).collect();
                let (x0, y0) = (mcu_x * mcu_width, mcu_y * mcu_height);
                for row in 0..mcu_height.min(height - y0) {
                    for col in 0..mcu_width.min(width - x0) {
                        // Grayscale keeps neutral chroma.
                        let ycbcr = match planes[..] {
                            [y, cb, cr] => [y.get(row, col), cb.get(row, col), cr.get(row, col)],
                            _ => [planes[0].get(row, col), 128.0, 128.0],
                        };
                        let offset = ((y0 + row) * width + x0 + col) * 3;
                        pixels[offset..offset + 3].copy_from_slice(&ycbcr_f32_to_rgb(ycbcr));
                    }
                }
            }
        }
        if br.total_bits_available() >= 8 {
            debug!(
                bits = br.total_bits_available(),
                "entropy-coded data left after last MCU"
            );
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use test_log::test;

    fn decode(data: &[u8]) -> Result<DecodedImage> {
        Decoder::new(data, DecoderOptions::default()).decode()
    }

    #[test]
    fn requires_soi() {
        assert_eq!(
            decode(&[0xff, 0xd9]).unwrap_err(),
            Error::Malformed(Malformed::MissingSoi)
        );
    }

    #[test]
    fn requires_eoi() {
        assert_eq!(
            decode(&[0xff, 0xd8]).unwrap_err(),
            Error::Malformed(Malformed::MissingEoi)
        );
    }

    #[test]
    fn requires_scan() {
        assert_eq!(
            decode(&[0xff, 0xd8, 0xff, 0xff, 0xd9]).unwrap_err(),
            Error::Malformed(Malformed::MissingScan)
        );
    }

    #[test]
    fn garbage_between_segments() {
        assert_eq!(
            decode(&[0xff, 0xd8, 0x12]).unwrap_err(),
            Error::Malformed(Malformed::ExpectedMarker {
                offset: 2,
                found: 0x12
            })
        );
    }

    #[test]
    fn rejects_non_baseline_frames() {
        for code in [0xc1, 0xc2, 0xc3, 0xc9, 0xcc, 0xcf] {
            assert_eq!(
                decode(&[0xff, 0xd8, 0xff, code, 0, 2]).unwrap_err(),
                Error::Unsupported(Unsupported::FrameType(code - 0xc0))
            );
        }
        assert_eq!(
            decode(&[0xff, 0xd8, 0xff, 0xdc, 0, 4, 0, 8]).unwrap_err(),
            Error::Unsupported(Unsupported::HierarchicalMarker(0xdc))
        );
    }

    #[test]
    fn segment_length_checks() {
        assert_eq!(
            decode(&[0xff, 0xd8, 0xff, 0xfe, 0, 1]).unwrap_err(),
            Error::Malformed(Malformed::SegmentTooShort {
                marker: 0xfe,
                length: 1
            })
        );
        assert_eq!(
            decode(&[0xff, 0xd8, 0xff, 0xfe, 0, 9, b'a']).unwrap_err(),
            Error::Malformed(Malformed::Truncated {
                marker: 0xfe,
                needed: 6
            })
        );
    }

    #[test]
    fn scan_before_frame() {
        let data = [
            0xff, 0xd8, 0xff, 0xda, 0, 8, 1, 1, 0x00, 0, 63, 0, 0xff, 0xd9,
        ];
        assert_eq!(
            decode(&data).unwrap_err(),
            Error::Malformed(Malformed::ScanBeforeFrame)
        );
    }

    #[test]
    fn skips_unknown_segments_and_collects_metadata() {
        let data = [
            0xff, 0xd8, //
            0xff, 0xe1, 0, 4, 1, 2, // APP1
            0xff, 0xe0, 0, 7, b'J', b'F', b'X', b'X', 0, // non-JFIF APP0
            0xff, 0xfe, 0, 4, b'h', b'i', //
            0xff, 0xdd, 0, 4, 0, 0, //
            0xff, 0xd9,
        ];
        let mut decoder = Decoder::new(&data, DecoderOptions::default());
        decoder.pos = 2;
        loop {
            let code = decoder.next_marker().unwrap();
            if code == Marker::Eoi as u8 {
                break;
            }
            decoder.handle_marker(code).unwrap();
        }
        assert_eq!(decoder.comments, vec![Comment(b"hi".to_vec())]);
        assert_eq!(decoder.restart_interval, Some(0));
        assert_eq!(decoder.jfif, None);
    }

    #[test]
    fn restart_marker_in_entropy_data() {
        let data = [0x12, 0xff, 0x00, 0x34, 0xff, 0xd1, 0x00];
        let mut decoder = Decoder::new(&data, DecoderOptions::default());
        assert_eq!(
            decoder.read_entropy_data().unwrap_err(),
            Error::Unsupported(Unsupported::RestartMarker(1))
        );
    }

    #[test]
    fn entropy_data_unstuffs_and_stops_at_marker() -> Result<()> {
        let data = [0x12, 0xff, 0x00, 0x34, 0xff, 0xff, 0xd9];
        let mut decoder = Decoder::new(&data, DecoderOptions::default());
        assert_eq!(decoder.read_entropy_data()?, vec![0x12, 0xff, 0x34]);
        assert_eq!(decoder.pos, 4);
        assert_eq!(decoder.next_marker()?, 0xd9);
        Ok(())
    }
}
