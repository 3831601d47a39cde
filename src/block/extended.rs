// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{InvalidInput, Result};

use super::{BlockDataType, BlockView, BlockViewMut};

/// Presents `inner` as a larger `width x height` view by replicating its last
/// row and column. Writes outside the real region are dropped.
#[derive(Clone, Debug)]
pub struct EdgeExtendedView<V> {
    inner: V,
    width: usize,
    height: usize,
}

impl<V> EdgeExtendedView<V> {
    pub fn new<T: BlockDataType>(inner: V, width: usize, height: usize) -> Result<Self>
    where
        V: BlockView<T>,
    {
        if inner.width() == 0 || inner.height() == 0 {
            return Err(InvalidInput::EmptyView(inner.width(), inner.height()).into());
        }
        Ok(EdgeExtendedView {
            inner,
            width,
            height,
        })
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<T: BlockDataType, V: BlockView<T>> BlockView<T> for EdgeExtendedView<V> {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.height && col < self.width);
        let row = row.min(self.inner.height() - 1);
        let col = col.min(self.inner.width() - 1);
        self.inner.get(row, col)
    }
}

impl<T: BlockDataType, V: BlockViewMut<T>> BlockViewMut<T> for EdgeExtendedView<V> {
    fn set(&mut self, row: usize, col: usize, value: T) {
        if row < self.inner.height() && col < self.inner.width() {
            self.inner.set(row, col, value);
        }
    }
}
