// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::error::{Malformed, Result};
use byteorder::{BigEndian, ByteOrder};

/// Reads MSB-first bits from entropy-coded data that has already been
/// un-stuffed.
#[derive(Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Valid bits are left-aligned.
    bit_buf: u64,
    bits_in_buf: usize,
    total_bits_read: usize,
}

impl Debug for BitReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitReader{{ data: [{} bytes], bit_buf: {:0width$b}, total_bits_read: {} }}",
            self.data.len(),
            self.bit_buf >> (64 - self.bits_in_buf.max(1)),
            self.total_bits_read,
            width = self.bits_in_buf
        )
    }
}

pub const MAX_BITS_PER_CALL: usize = 56;

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader {
            data,
            bit_buf: 0,
            bits_in_buf: 0,
            total_bits_read: 0,
        }
    }

    /// Reads `num` bits from the buffer without consuming them.
    pub fn peek(&mut self, num: usize) -> Result<u64> {
        debug_assert!(num <= MAX_BITS_PER_CALL);
        if num == 0 {
            return Ok(0);
        }
        self.refill();
        if self.bits_in_buf < num {
            return Err(Malformed::OutOfBits {
                bits: self.total_bits_read,
            }
            .into());
        }
        Ok(self.bit_buf >> (64 - num))
    }

    /// Advances by `num` bits, which must already be buffered.
    pub fn consume(&mut self, num: usize) -> Result<()> {
        if self.bits_in_buf < num {
            return Err(Malformed::OutOfBits {
                bits: self.total_bits_read,
            }
            .into());
        }
        self.bit_buf = self.bit_buf.checked_shl(num as u32).unwrap_or(0);
        self.bits_in_buf -= num;
        self.total_bits_read += num;
        Ok(())
    }

    /// Reads `num` bits from the buffer.
    /// ```
    /// # use jfif::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0b1010_0000, 1]);
    /// assert_eq!(br.read(3)?, 0b101);
    /// assert_eq!(br.read(5)?, 0);
    /// assert_eq!(br.read(8)?, 1);
    /// assert_eq!(br.total_bits_read(), 16);
    /// assert!(br.read(1).is_err());
    /// # Ok::<(), jfif::error::Error>(())
    /// ```
    pub fn read(&mut self, num: usize) -> Result<u64> {
        let ret = self.peek(num)?;
        self.consume(num)?;
        Ok(ret)
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read(1)? == 1)
    }

    /// Returns the total number of bits that have been read.
    pub fn total_bits_read(&self) -> usize {
        self.total_bits_read
    }

    /// Returns the total number of bits that can still be read.
    pub fn total_bits_available(&self) -> usize {
        self.data.len() * 8 + self.bits_in_buf
    }

    fn refill(&mut self) {
        if self.data.len() >= 8 {
            // Bits past the counted bytes are the next bytes' bits, and get
            // OR-ed in again unchanged on the following refill.
            let bits = BigEndian::read_u64(self.data);
            self.bit_buf |= bits >> self.bits_in_buf;
            let read_bytes = (63 - self.bits_in_buf) >> 3;
            self.bits_in_buf |= 56;
            self.data = &self.data[read_bytes..];
        } else {
            self.refill_slow()
        }
    }

    #[inline(never)]
    fn refill_slow(&mut self) {
        while self.bits_in_buf < 56 {
            if self.data.is_empty() {
                return;
            }
            self.bit_buf |= (self.data[0] as u64) << (56 - self.bits_in_buf);
            self.bits_in_buf += 8;
            self.data = &self.data[1..];
        }
    }
}
