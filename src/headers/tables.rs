// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::{Marker, Segment, SegmentReader, SegmentWriter};
use crate::BLOCK_SIZE;
use crate::entropy_coding::huffman::{HuffmanTable, MAX_CODE_LENGTH};
use crate::error::{Error, InvalidInput, Malformed, Result};
use crate::quantizer::QuantizationTable;
use crate::util::tracing_wrappers::*;

/// Number of table slots for each table kind.
pub const NUM_SLOTS: usize = 4;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QuantTableDef {
    pub slot: u8,
    pub table: QuantizationTable,
}

/// A DQT segment, one or more tables.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct QuantTables(pub Vec<QuantTableDef>);

impl Segment for QuantTables {
    const MARKER: Marker = Marker::Dqt;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        let mut tables = vec![];
        while !reader.is_empty() {
            let (precision, slot) = reader.read_nibbles()?;
            if slot as usize >= NUM_SLOTS {
                return Err(Malformed::InvalidQuantSlot(slot).into());
            }
            let mut zigzag = [0u16; BLOCK_SIZE];
            for v in zigzag.iter_mut() {
                *v = match precision {
                    0 => reader.read_u8()? as u16,
                    1 => reader.read_u16()?,
                    _ => return Err(Malformed::InvalidQuantPrecision(precision).into()),
                };
            }
            let table = QuantizationTable::from_zigzag(&zigzag)
                .map_err(|_| Malformed::ZeroQuantEntry(slot))?;
            debug!(slot, precision, "quantization table");
            tables.push(QuantTableDef { slot, table });
        }
        Ok(QuantTables(tables))
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        for def in &self.0 {
            let wide = !def.table.is_8bit();
            writer.write_nibbles(wide as u8, def.slot);
            for v in def.table.to_zigzag() {
                if wide {
                    writer.write_u16(v);
                } else {
                    writer.write_u8(v as u8);
                }
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum TableClass {
    Dc = 0,
    Ac = 1,
}

impl TableClass {
    pub fn name(self) -> &'static str {
        match self {
            TableClass::Dc => "DC",
            TableClass::Ac => "AC",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HuffmanTableDef {
    pub class: TableClass,
    pub slot: u8,
    pub table: HuffmanTable,
}

/// A DHT segment, one or more tables.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct HuffmanTables(pub Vec<HuffmanTableDef>);

impl Segment for HuffmanTables {
    const MARKER: Marker = Marker::Dht;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        let mut tables = vec![];
        while !reader.is_empty() {
            let (class, slot) = reader.read_nibbles()?;
            let class = TableClass::from_u8(class).ok_or(Malformed::InvalidHuffmanClass(class))?;
            if slot as usize >= NUM_SLOTS {
                return Err(Malformed::InvalidHuffmanSlot(slot).into());
            }
            let mut counts = [0u8; MAX_CODE_LENGTH];
            counts.copy_from_slice(reader.read_bytes(MAX_CODE_LENGTH)?);
            let total: usize = counts.iter().map(|&c| c as usize).sum();
            if total == 0 {
                return Err(Malformed::InvalidHuffmanTable.into());
            }
            let values = reader.read_bytes(total)?;
            let table = HuffmanTable::from_counts(&counts, values)?;
            debug!(class = class.name(), slot, symbols = total, "Huffman table");
            tables.push(HuffmanTableDef { class, slot, table });
        }
        Ok(HuffmanTables(tables))
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        for def in &self.0 {
            writer.write_nibbles(def.class as u8, def.slot);
            writer.write_bytes(&def.table.counts());
            writer.write_bytes(&def.table.values());
        }
        Ok(())
    }
}

/// DRI: MCUs between restart markers, 0 when restarts are disabled.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct RestartInterval(pub u16);

impl Segment for RestartInterval {
    const MARKER: Marker = Marker::Dri;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        Ok(RestartInterval(reader.read_u16()?))
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        writer.write_u16(self.0);
        Ok(())
    }
}

/// COM: free-form bytes, conventionally text.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Comment(pub Vec<u8>);

impl Comment {
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Segment for Comment {
    const MARKER: Marker = Marker::Com;

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        Ok(Comment(reader.read_rest().to_vec()))
    }

    fn write_payload(&self, writer: &mut SegmentWriter) -> Result<()> {
        writer.write_bytes(&self.0);
        Ok(())
    }
}

/// Checks a table is usable by the 8-bit baseline encoder.
pub fn check_baseline_table(table: &QuantizationTable) -> Result<()> {
    match table.values().iter().find(|&&v| v == 0 || v > 255) {
        Some(&v) => Err(Error::InvalidInput(InvalidInput::QuantEntry(v))),
        None => Ok(()),
    }
}
