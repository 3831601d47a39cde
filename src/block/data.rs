// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{InvalidInput, Result};

use super::{BlockDataType, BlockView, BlockViewMut};

/// An owned, tightly packed row-major block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockData<T: BlockDataType> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: BlockDataType> BlockData<T> {
    /// A block with every cell set to the type's zero value.
    pub fn new(width: usize, height: usize) -> BlockData<T> {
        BlockData {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<BlockData<T>> {
        if data.len() != width * height {
            return Err(InvalidInput::WindowOutOfBounds {
                kind: T::DATA_TYPE_ID,
                width,
                height,
                offset: 0,
                stride: width,
                len: data.len(),
            }
            .into());
        }
        Ok(BlockData {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> BlockData<T> {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        BlockData {
            width,
            height,
            data,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: BlockDataType> BlockView<T> for BlockData<T> {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn get(&self, row: usize, col: usize) -> T {
        assert!(col < self.width, "column {col} outside width {}", self.width);
        self.data[row * self.width + col]
    }
    fn get_index(&self, index: usize) -> T {
        self.data[index]
    }
}

impl<T: BlockDataType> BlockViewMut<T> for BlockData<T> {
    fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(col < self.width, "column {col} outside width {}", self.width);
        self.data[row * self.width + col] = value;
    }
    fn set_index(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }
}
