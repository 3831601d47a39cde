// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Zigzag scan order of an 8x8 block.

use crate::BLOCK_SIZE;

/// `ZIGZAG_TO_NATURAL[k]` is the row-major index of the `k`-th coefficient in
/// scan order.
pub const ZIGZAG_TO_NATURAL: [usize; BLOCK_SIZE] = [
    0, 1, 8, 16, 9, 2, 3, 10, //
    17, 24, 32, 25, 18, 11, 4, 5, //
    12, 19, 26, 33, 40, 48, 41, 34, //
    27, 20, 13, 6, 7, 14, 21, 28, //
    35, 42, 49, 56, 57, 50, 43, 36, //
    29, 22, 15, 23, 30, 37, 44, 51, //
    58, 59, 52, 45, 38, 31, 39, 46, //
    53, 60, 61, 54, 47, 55, 62, 63, //
];

/// Inverse of [`ZIGZAG_TO_NATURAL`]: the scan position of each row-major cell.
pub const NATURAL_TO_ZIGZAG: [usize; BLOCK_SIZE] = {
    let mut table = [0; BLOCK_SIZE];
    let mut k = 0;
    while k < BLOCK_SIZE {
        table[ZIGZAG_TO_NATURAL[k]] = k;
        k += 1;
    }
    table
};
