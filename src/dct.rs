// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Direct 8x8 type-II DCT and its inverse, as defined in ITU-T T.81 A.3.3.

use std::f64::consts::FRAC_1_SQRT_2;
use std::f64::consts::PI;

use crate::BLOCK_DIM;
use crate::block::{BlockData, BlockDataType, BlockView};

/// Offset between unsigned 8-bit samples and the signed transform input.
pub const LEVEL_SHIFT: f64 = 128.0;

#[inline(always)]
fn alpha(u: usize) -> f64 {
    if u == 0 { FRAC_1_SQRT_2 } else { 1.0 }
}

/// `basis[u][x] = cos((2x + 1) u pi / 16)`
fn cosine_basis() -> [[f64; BLOCK_DIM]; BLOCK_DIM] {
    array_init::array_init(|u| {
        array_init::array_init(|x| {
            ((x as f64 + 0.5) * u as f64 * PI / BLOCK_DIM as f64).cos()
        })
    })
}

/// Forward transform of an 8x8 sample block. Coefficient `(u, v)` lands at
/// row `v`, column `u`.
///
/// The view must be at least 8x8; wrap smaller windows in an
/// [`EdgeExtendedView`](crate::block::EdgeExtendedView) first.
pub fn forward_dct<V: BlockView<u8> + ?Sized>(block: &V) -> BlockData<f32> {
    let basis = cosine_basis();
    let mut samples = [[0.0f64; BLOCK_DIM]; BLOCK_DIM];
    for (y, row) in samples.iter_mut().enumerate() {
        for (x, sample) in row.iter_mut().enumerate() {
            *sample = block.get(y, x) as f64 - LEVEL_SHIFT;
        }
    }
    BlockData::from_fn(BLOCK_DIM, BLOCK_DIM, |v, u| {
        let mut sum = 0.0;
        for (y, row) in samples.iter().enumerate() {
            for (x, sample) in row.iter().enumerate() {
                sum += sample * basis[u][x] * basis[v][y];
            }
        }
        (0.25 * alpha(u) * alpha(v) * sum) as f32
    })
}

/// Inverse transform back to the unsigned sample range. The output is not
/// clamped.
pub fn inverse_dct<T: BlockDataType, V: BlockView<T> + ?Sized>(coefficients: &V) -> BlockData<f32> {
    let basis = cosine_basis();
    let mut scaled = [[0.0f64; BLOCK_DIM]; BLOCK_DIM];
    for (v, row) in scaled.iter_mut().enumerate() {
        for (u, coefficient) in row.iter_mut().enumerate() {
            *coefficient = alpha(u) * alpha(v) * coefficients.get(v, u).to_f64();
        }
    }
    BlockData::from_fn(BLOCK_DIM, BLOCK_DIM, |y, x| {
        let mut sum = 0.0;
        for (v, row) in scaled.iter().enumerate() {
            for (u, coefficient) in row.iter().enumerate() {
                sum += coefficient * basis[u][x] * basis[v][y];
            }
        }
        (0.25 * sum + LEVEL_SHIFT) as f32
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::{ArrayBlockView, EdgeExtendedView, convert, to_vec};
    use crate::error::Result;
    use crate::util::test::{assert_all_almost_eq, assert_almost_eq};
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    // ITU-T T.81 / Wikipedia "JPEG" worked example.
    const SAMPLES: [u8; 64] = [
        52, 55, 61, 66, 70, 61, 64, 73, //
        63, 59, 55, 90, 109, 85, 69, 72, //
        62, 59, 68, 113, 144, 104, 66, 73, //
        63, 58, 71, 122, 154, 106, 70, 69, //
        67, 61, 68, 104, 126, 88, 68, 70, //
        79, 65, 60, 70, 77, 68, 58, 75, //
        85, 71, 64, 59, 55, 61, 65, 83, //
        87, 79, 69, 68, 65, 76, 78, 94, //
    ];

    const TRUNCATED: [i32; 64] = [
        -415, -30, -61, 27, 56, -20, -2, 0, //
        4, -21, -60, 10, 13, -7, -8, 4, //
        -46, 7, 77, -24, -28, 9, 5, -5, //
        -48, 12, 34, -14, -10, 6, 1, 1, //
        12, -6, -13, -3, -1, 1, -2, 3, //
        -7, 2, 2, -5, -2, 0, 4, 1, //
        -1, 0, 0, -2, 0, -3, 4, 0, //
        0, 0, -1, -4, -1, 0, 0, 1, //
    ];

    #[test]
    fn forward_matches_reference() -> Result<()> {
        let block = ArrayBlockView::new(&SAMPLES, 0, 8, 8, 8)?;
        let coefficients = forward_dct(&block);
        let truncated: Vec<i32> = to_vec(&coefficients).iter().map(|&c| c as i32).collect();
        assert_eq!(truncated, TRUNCATED);
        Ok(())
    }

    #[test]
    fn inverse_of_truncated_reproduces_samples() -> Result<()> {
        let coefficients = BlockData::from_vec(8, 8, TRUNCATED.to_vec())?;
        let samples: BlockData<i32> = convert(&inverse_dct(&coefficients));
        let expected: Vec<i32> = SAMPLES.iter().map(|&s| s as i32).collect();
        assert_all_almost_eq!(to_vec(&samples), expected, 1);
        Ok(())
    }

    #[test]
    fn round_trip_random_blocks() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        for _ in 0..16 {
            let block = BlockData::from_fn(8, 8, |_, _| rng.random::<u8>());
            let restored = inverse_dct(&forward_dct(&block));
            let expected: Vec<f32> = to_vec(&block).iter().map(|&s| s as f32).collect();
            assert_all_almost_eq!(to_vec(&restored), expected, 1e-3);
        }
    }

    #[test]
    fn flat_block_has_only_dc() {
        let block = BlockData::from_fn(8, 8, |_, _| 255u8);
        let coefficients = forward_dct(&block);
        assert_almost_eq!(coefficients.get(0, 0), 1016.0, 1e-3);
        for &c in &to_vec(&coefficients)[1..] {
            assert_almost_eq!(c, 0.0, 1e-3);
        }
    }

    #[test]
    fn undersized_block_matches_explicit_replication() -> Result<()> {
        let plane: Vec<u8> = (0..30).map(|i| (i * 7 % 256) as u8).collect();
        let real = ArrayBlockView::window(&plane, 6, 1, 2, 5, 3)?;
        let extended = EdgeExtendedView::new(real, 8, 8)?;
        let explicit = BlockData::from_fn(8, 8, |row, col| {
            plane[(2 + row.min(2)) * 6 + 1 + col.min(4)]
        });
        assert_eq!(
            to_vec(&forward_dct(&extended)),
            to_vec(&forward_dct(&explicit))
        );
        Ok(())
    }
}
