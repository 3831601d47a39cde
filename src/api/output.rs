// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::headers::{Comment, JfifHeader};

/// A decoded image and the metadata segments that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    /// Interleaved RGB, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    pub jfif: Option<JfifHeader>,
    pub comments: Vec<Comment>,
    /// Interval from a DRI segment, if one was present.
    pub restart_interval: Option<u16>,
    /// Number of components in the frame: 1 for grayscale, 3 for YCbCr.
    pub components: usize,
}

impl DecodedImage {
    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }
}
