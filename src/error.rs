// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

use crate::block::DataTypeTag;

/// Stream features that are valid JPEG but outside baseline sequential decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    #[error("frame type SOF{0} is not baseline sequential")]
    FrameType(u8),
    #[error("hierarchical or DNL marker 0xFF{0:02X}")]
    HierarchicalMarker(u8),
    #[error("second frame header")]
    MultipleFrames,
    #[error("second scan header")]
    MultipleScans,
    #[error("scan covers {scan} of {frame} components")]
    PartialScan { scan: usize, frame: usize },
    #[error("restart marker RST{0} inside entropy-coded data")]
    RestartMarker(u8),
    #[error("sample precision of {0} bits")]
    SamplePrecision(u8),
    #[error("{0} color components")]
    ComponentCount(usize),
    #[error("spectral selection {start}..={end} with successive approximation {high}/{low}")]
    SpectralSelection { start: u8, end: u8, high: u8, low: u8 },
    #[error("image height defined by a later DNL segment")]
    DeferredHeight,
}

/// Stream contents that violate the JPEG/JFIF syntax.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("stream does not start with SOI")]
    MissingSoi,
    #[error("expected a marker at byte {offset}, found 0x{found:02X}")]
    ExpectedMarker { offset: usize, found: u8 },
    #[error("stream ended before EOI")]
    MissingEoi,
    #[error("segment 0xFF{marker:02X} declares length {length}, shorter than its own length field")]
    SegmentTooShort { marker: u8, length: u16 },
    #[error("segment 0xFF{marker:02X} truncated: needed {needed} more bytes")]
    Truncated { marker: u8, needed: usize },
    #[error("segment 0xFF{marker:02X} has {extra} trailing bytes")]
    TrailingBytes { marker: u8, extra: usize },
    #[error("invalid JFIF identifier")]
    InvalidJfifIdentifier,
    #[error("invalid JFIF density units {0}")]
    InvalidDensityUnits(u8),
    #[error("invalid quantization table precision {0}")]
    InvalidQuantPrecision(u8),
    #[error("quantization table slot {0} out of range")]
    InvalidQuantSlot(u8),
    #[error("quantization table {0} contains a zero entry")]
    ZeroQuantEntry(u8),
    #[error("Huffman table class {0} out of range")]
    InvalidHuffmanClass(u8),
    #[error("Huffman table slot {0} out of range")]
    InvalidHuffmanSlot(u8),
    #[error("Huffman table code lengths oversubscribe the code space")]
    InvalidHuffmanTable,
    #[error("Huffman table declares {0} symbols")]
    TooManySymbols(usize),
    #[error("Huffman code descends into a missing right child")]
    MissingRightChild,
    #[error("entropy-coded data ended after {bits} bits")]
    OutOfBits { bits: usize },
    #[error("image dimensions {0}x{1}")]
    InvalidDimensions(u16, u16),
    #[error("sampling factors {0}x{1} outside 1..=4")]
    InvalidSamplingFactor(u8, u8),
    #[error("MCU of {0} blocks exceeds the baseline limit of 10")]
    McuTooLarge(usize),
    #[error("duplicate component id {0}")]
    DuplicateComponent(u8),
    #[error("scan references unknown component id {0}")]
    UnknownComponent(u8),
    #[error("component {component} references undefined quantization table {slot}")]
    MissingQuantTable { component: u8, slot: u8 },
    #[error("scan references undefined {class} Huffman table {slot}")]
    MissingHuffmanTable { class: &'static str, slot: u8 },
    #[error("scan header before frame header")]
    ScanBeforeFrame,
    #[error("no scan in stream")]
    MissingScan,
    #[error("magnitude category {0} out of range")]
    InvalidCategory(u8),
    #[error("AC run overflows block at coefficient {0}")]
    CoefficientOverflow(usize),
    #[error("DC coefficient {0} outside the 8-bit sample range")]
    DcOutOfRange(i64),
    #[error("block {block} of component {component} in MCU {mcu}: {source}")]
    Block {
        mcu: usize,
        component: u8,
        block: usize,
        source: Box<Error>,
    },
}

/// Broken internal invariants. These indicate an encoder bug, not bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Internal {
    #[error("canonical Huffman tree has depth {0}, limit is 16")]
    HuffmanTooDeep(usize),
    #[error("no Huffman code for symbol 0x{0:02X}")]
    MissingCode(u8),
    #[error("{kind} value {value} needs magnitude category above {max}")]
    CoefficientOutOfRange {
        kind: &'static str,
        value: i32,
        max: u8,
    },
}

/// Mistakes on the caller's side of the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    PixelBufferSize { expected: usize, actual: usize },
    #[error("image dimensions {0}x{1} must be in 1..=65535")]
    Dimensions(usize, usize),
    #[error(
        "{kind:?} window {width}x{height} at offset {offset} with stride {stride} runs off a {len}-element buffer"
    )]
    WindowOutOfBounds {
        kind: DataTypeTag,
        width: usize,
        height: usize,
        offset: usize,
        stride: usize,
        len: usize,
    },
    #[error("cannot scale {from_w}x{from_h} to {to_w}x{to_h} by integer ratios")]
    NonIntegerRatio {
        from_w: usize,
        from_h: usize,
        to_w: usize,
        to_h: usize,
    },
    #[error("composite of {tiles} tiles is not a multiple of {across} tiles across")]
    TileCount { tiles: usize, across: usize },
    #[error("tile {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    TileSize {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    #[error("empty view {0}x{1}")]
    EmptyView(usize, usize),
    #[error("cannot build a Huffman tree from an empty alphabet")]
    EmptyAlphabet,
    #[error("quantization entry {0} outside 1..=255")]
    QuantEntry(u16),
    #[error("thumbnail of {0} bytes does not match its dimensions")]
    ThumbnailSize(usize),
    #[error("segment 0xFF{marker:02X} payload of {length} bytes does not fit a length field")]
    SegmentTooLong { marker: u8, length: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported JPEG feature: {0}")]
    Unsupported(#[from] Unsupported),
    #[error("Malformed JPEG stream: {0}")]
    Malformed(#[from] Malformed),
    #[error("Internal error: {0}")]
    Internal(#[from] Internal),
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
