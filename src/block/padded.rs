// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use super::{BlockDataType, BlockView, BlockViewMut};

/// Places `inner` at the top-left of a fixed logical frame. Cells beyond the
/// source read as zero and ignore writes.
#[derive(Clone, Debug)]
pub struct ZeroPaddedView<V> {
    inner: V,
    width: usize,
    height: usize,
}

impl<V> ZeroPaddedView<V> {
    pub fn new(inner: V, width: usize, height: usize) -> Self {
        ZeroPaddedView {
            inner,
            width,
            height,
        }
    }
}

impl<T: BlockDataType, V: BlockView<T>> BlockView<T> for ZeroPaddedView<V> {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.height && col < self.width);
        if row < self.inner.height() && col < self.inner.width() {
            self.inner.get(row, col)
        } else {
            T::default()
        }
    }
}

impl<T: BlockDataType, V: BlockViewMut<T>> BlockViewMut<T> for ZeroPaddedView<V> {
    fn set(&mut self, row: usize, col: usize, value: T) {
        if row < self.inner.height() && col < self.inner.width() {
            self.inner.set(row, col, value);
        }
    }
}
