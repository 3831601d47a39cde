// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_traits::Num;

pub fn abs_delta<T: Num + std::cmp::PartialOrd>(left_val: T, right_val: T) -> T {
    if left_val > right_val {
        left_val - right_val
    } else {
        right_val - left_val
    }
}

macro_rules! assert_almost_eq {
    ($left:expr, $right:expr, $max_error:expr $(,)?) => {
        let (left_val, right_val, max_error) = (&$left, &$right, &$max_error);
        match $crate::util::test::abs_delta(*left_val, *right_val).partial_cmp(max_error) {
            Some(std::cmp::Ordering::Greater) | None => panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n max_error: `{:?}`",
                left_val, right_val, max_error
            ),
            _ => {}
        }
    };
}
pub(crate) use assert_almost_eq;

macro_rules! assert_all_almost_eq {
    ($left:expr, $right:expr, $max_error:expr $(,)?) => {
        let (left_val, right_val, max_error) = (&$left, &$right, &$max_error);
        if left_val.len() != right_val.len() {
            panic!("assertion failed: `(left ≈ right)`\n left.len(): `{}`,\n right.len(): `{}`", left_val.len(), right_val.len());
        }
        for index in 0..left_val.len() {
            match $crate::util::test::abs_delta(left_val[index], right_val[index]).partial_cmp(max_error) {
                Some(std::cmp::Ordering::Greater) | None =>  panic!(
                    "assertion failed: `(left ≈ right)`\n left: `{:?}`,\n right: `{:?}`,\n max_error: `{:?}`,\n left[{}]: `{:?}`,\n right[{}]: `{:?}`",
                    left_val, right_val, max_error, index, left_val[index], index, right_val[index]
                ),
                _ => {}
            }
        }
    };
}
pub(crate) use assert_all_almost_eq;

/// Interleaved RGB test image: a smooth diagonal gradient.
pub fn gradient_rgb(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let fx = x * 255 / (width - 1).max(1);
            let fy = y * 255 / (height - 1).max(1);
            pixels.push(fx as u8);
            pixels.push(fy as u8);
            pixels.push(((fx + fy) / 2) as u8);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use std::panic;

    #[test]
    fn test_with_floats() {
        assert_almost_eq!(1.0000001f64, 1.0000002, 0.000001);
        assert_almost_eq!(1.0, 1.1, 0.2);
    }

    #[test]
    fn test_with_ints() {
        assert_almost_eq!(100, 101, 2);
        assert_all_almost_eq!([0u8, 255], [1u8, 254], 1u8);
    }

    #[test]
    fn test_fails_outside_tolerance() {
        assert!(panic::catch_unwind(|| {
            assert_almost_eq!(100, 103, 2);
        })
        .is_err());
    }

    #[test]
    fn test_all_fails_on_length_mismatch() {
        assert!(panic::catch_unwind(|| {
            assert_all_almost_eq!([1.0, 2.0], [1.0], 0.5);
        })
        .is_err());
    }

    #[test]
    fn test_gradient_corners() {
        let pixels = super::gradient_rgb(16, 16);
        assert_eq!(pixels.len(), 16 * 16 * 3);
        assert_eq!(&pixels[..3], &[0, 0, 0]);
        assert_eq!(&pixels[pixels.len() - 3..], &[255, 255, 255]);
    }
}
