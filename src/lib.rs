// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]
pub mod api;
pub mod bit_reader;
pub mod bit_writer;
pub mod block;
pub mod coeff_order;
pub mod color;
pub mod dct;
pub mod decode;
pub mod encode;
pub mod entropy_coding;
pub mod error;
pub mod headers;
pub mod quantizer;
pub mod util;

pub use api::{decode, decode_with_options, encode, encode_with_options};

const BLOCK_DIM: usize = 8;
const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;
