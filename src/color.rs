// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! JFIF RGB <-> YCbCr conversion, full 0..=255 range for all channels.

fn to_sample(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn rgb_to_ycbcr_f32([r, g, b]: [f32; 3]) -> [f32; 3] {
    [
        0.299 * r + 0.587 * g + 0.114 * b,
        128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b,
        128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b,
    ]
}

pub fn ycbcr_to_rgb_f32([y, cb, cr]: [f32; 3]) -> [f32; 3] {
    let (cb, cr) = (cb - 128.0, cr - 128.0);
    [
        y + 1.402 * cr,
        y - 0.344136 * cb - 0.714136 * cr,
        y + 1.772 * cb,
    ]
}

pub fn rgb_to_ycbcr(rgb: [u8; 3]) -> [u8; 3] {
    rgb_to_ycbcr_f32(rgb.map(f32::from)).map(to_sample)
}

pub fn ycbcr_to_rgb(ycbcr: [u8; 3]) -> [u8; 3] {
    ycbcr_to_rgb_f32(ycbcr.map(f32::from)).map(to_sample)
}

/// Converts unrounded YCbCr samples straight to clamped RGB, so decoded
/// planes are rounded once.
pub fn ycbcr_f32_to_rgb(ycbcr: [f32; 3]) -> [u8; 3] {
    ycbcr_to_rgb_f32(ycbcr).map(to_sample)
}

fn convert_in_place(buf: &mut [u8], f: fn([u8; 3]) -> [u8; 3]) {
    debug_assert_eq!(buf.len() % 3, 0);
    for pixel in buf.chunks_exact_mut(3) {
        let converted = f([pixel[0], pixel[1], pixel[2]]);
        pixel.copy_from_slice(&converted);
    }
}

/// Converts an interleaved RGB buffer to interleaved YCbCr.
pub fn rgb_to_ycbcr_in_place(buf: &mut [u8]) {
    convert_in_place(buf, rgb_to_ycbcr)
}

/// Converts an interleaved YCbCr buffer to interleaved RGB.
pub fn ycbcr_to_rgb_in_place(buf: &mut [u8]) {
    convert_in_place(buf, ycbcr_to_rgb)
}

/// Splits interleaved RGB pixels into Y, Cb and Cr planes.
pub fn rgb_to_ycbcr_planes(pixels: &[u8]) -> [Vec<u8>; 3] {
    let count = pixels.len() / 3;
    let mut planes = [
        Vec::with_capacity(count),
        Vec::with_capacity(count),
        Vec::with_capacity(count),
    ];
    for pixel in pixels.chunks_exact(3) {
        let ycbcr = rgb_to_ycbcr([pixel[0], pixel[1], pixel[2]]);
        for (plane, v) in planes.iter_mut().zip(ycbcr) {
            plane.push(v);
        }
    }
    planes
}
