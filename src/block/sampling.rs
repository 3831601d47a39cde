// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::marker::PhantomData;

use crate::error::{InvalidInput, Result};

use super::{BlockDataType, BlockView, BlockViewMut};

/// Magnifies `inner` by integer ratios; each destination cell repeats the
/// source cell it falls in.
#[derive(Clone, Debug)]
pub struct NearestNeighborView<V> {
    inner: V,
    ratio_x: usize,
    ratio_y: usize,
}

impl<V> NearestNeighborView<V> {
    pub fn new<T: BlockDataType>(inner: V, width: usize, height: usize) -> Result<Self>
    where
        V: BlockView<T>,
    {
        let (from_w, from_h) = (inner.width(), inner.height());
        if from_w == 0 || from_h == 0 || width % from_w != 0 || height % from_h != 0 {
            return Err(InvalidInput::NonIntegerRatio {
                from_w,
                from_h,
                to_w: width,
                to_h: height,
            }
            .into());
        }
        Ok(NearestNeighborView {
            inner,
            ratio_x: width / from_w,
            ratio_y: height / from_h,
        })
    }
}

impl<T: BlockDataType, V: BlockView<T>> BlockView<T> for NearestNeighborView<V> {
    fn width(&self) -> usize {
        self.inner.width() * self.ratio_x
    }
    fn height(&self) -> usize {
        self.inner.height() * self.ratio_y
    }
    fn get(&self, row: usize, col: usize) -> T {
        self.inner.get(row / self.ratio_y, col / self.ratio_x)
    }
}

/// Writing a magnified cell writes the source cell behind it.
impl<T: BlockDataType, V: BlockViewMut<T>> BlockViewMut<T> for NearestNeighborView<V> {
    fn set(&mut self, row: usize, col: usize, value: T) {
        self.inner.set(row / self.ratio_y, col / self.ratio_x, value);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tap {
    near: usize,
    far: usize,
    /// Weight of `far`; `near` gets `1 - frac`.
    frac: f32,
}

/// Source-cell-centred sampling positions for resizing `from` cells to `to`.
fn taps(from: usize, to: usize) -> Vec<Tap> {
    let scale = from as f64 / to as f64;
    let last = (from - 1) as f64;
    (0..to)
        .map(|d| {
            let s = ((d as f64 + 0.5) * scale - 0.5).clamp(0.0, last);
            let near = s.floor() as usize;
            Tap {
                near,
                far: (near + 1).min(from - 1),
                frac: (s - near as f64) as f32,
            }
        })
        .collect()
}

/// Resizes `inner` to `width x height` with bilinear interpolation between the
/// four nearest source-cell centres. Read only.
#[derive(Clone, Debug)]
pub struct BilinearView<V, T> {
    inner: V,
    cols: Vec<Tap>,
    rows: Vec<Tap>,
    _element: PhantomData<T>,
}

impl<T: BlockDataType, V: BlockView<T>> BilinearView<V, T> {
    pub fn new(inner: V, width: usize, height: usize) -> Result<Self> {
        if inner.width() == 0 || inner.height() == 0 {
            return Err(InvalidInput::EmptyView(inner.width(), inner.height()).into());
        }
        Ok(BilinearView {
            cols: taps(inner.width(), width),
            rows: taps(inner.height(), height),
            inner,
            _element: PhantomData,
        })
    }
}

impl<T: BlockDataType, V: BlockView<T>> BlockView<f32> for BilinearView<V, T> {
    fn width(&self) -> usize {
        self.cols.len()
    }
    fn height(&self) -> usize {
        self.rows.len()
    }
    fn get(&self, row: usize, col: usize) -> f32 {
        let (y, x) = (self.rows[row], self.cols[col]);
        let sample = |r: usize, c: usize| self.inner.get(r, c).to_f64() as f32;
        let top = sample(y.near, x.near) * (1.0 - x.frac) + sample(y.near, x.far) * x.frac;
        let bottom = sample(y.far, x.near) * (1.0 - x.frac) + sample(y.far, x.far) * x.frac;
        top * (1.0 - y.frac) + bottom * y.frac
    }
}
