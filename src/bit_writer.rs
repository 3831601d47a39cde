// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Writes MSB-first bits into entropy-coded segment bytes, inserting a stuffed
/// `0x00` after every `0xFF`.
#[derive(Debug, Default)]
pub struct BitWriter {
    output: Vec<u8>,
    buf: u64,
    bits_in_buf: usize,
    total_bits_written: usize,
}

pub const MAX_BITS_PER_CALL: usize = 32;

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit_byte(&mut self, b: u8) {
        self.output.push(b);
        if b == 0xff {
            self.output.push(0);
        }
    }

    /// Appends the low `len` bits of `bits`, most significant first.
    pub fn write(&mut self, bits: u32, len: usize) {
        debug_assert!(len <= MAX_BITS_PER_CALL);
        if len == 0 {
            return;
        }
        let mask = (1u64 << len) - 1;
        self.buf = (self.buf << len) | (bits as u64 & mask);
        self.bits_in_buf += len;
        self.total_bits_written += len;
        while self.bits_in_buf >= 8 {
            self.bits_in_buf -= 8;
            self.emit_byte((self.buf >> self.bits_in_buf) as u8);
        }
        self.buf &= (1u64 << self.bits_in_buf) - 1;
    }

    /// Number of bits needed to reach the next byte boundary.
    pub fn padding_bits(&self) -> usize {
        (8 - self.bits_in_buf % 8) % 8
    }

    pub fn total_bits_written(&self) -> usize {
        self.total_bits_written
    }

    /// Completes the last byte with 1 bits.
    pub fn pad_with_ones(&mut self) {
        let padding = self.padding_bits();
        self.write((1 << padding) - 1, padding);
    }

    pub fn finalize(mut self) -> Vec<u8> {
        self.pad_with_ones();
        self.output
    }
}
