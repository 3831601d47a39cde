// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::error::{InvalidInput, Result};

use super::{BlockDataType, BlockView, BlockViewMut};

fn check_window<T: BlockDataType>(
    len: usize,
    offset: usize,
    stride: usize,
    width: usize,
    height: usize,
) -> Result<()> {
    let fits = width <= stride
        && (height == 0
            || width == 0
            || (height - 1)
                .checked_mul(stride)
                .and_then(|v| v.checked_add(offset + width))
                .is_some_and(|end| end <= len));
    if !fits {
        return Err(InvalidInput::WindowOutOfBounds {
            kind: T::DATA_TYPE_ID,
            width,
            height,
            offset,
            stride,
            len,
        }
        .into());
    }
    Ok(())
}

/// A `width x height` window into a shared row-major buffer.
#[derive(Clone, Copy)]
pub struct ArrayBlockView<'a, T: BlockDataType> {
    data: &'a [T],
    offset: usize,
    stride: usize,
    width: usize,
    height: usize,
}

impl<T: BlockDataType> Debug for ArrayBlockView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} {}x{} @{} stride {}",
            T::DATA_TYPE_ID,
            self.width,
            self.height,
            self.offset,
            self.stride
        )
    }
}

impl<'a, T: BlockDataType> ArrayBlockView<'a, T> {
    pub fn new(
        data: &'a [T],
        offset: usize,
        stride: usize,
        width: usize,
        height: usize,
    ) -> Result<ArrayBlockView<'a, T>> {
        check_window::<T>(data.len(), offset, stride, width, height)?;
        Ok(ArrayBlockView {
            data,
            offset,
            stride,
            width,
            height,
        })
    }

    /// Window whose top-left corner is at column `x`, row `y` of a plane
    /// with `stride` columns.
    pub fn window(
        data: &'a [T],
        stride: usize,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ArrayBlockView<'a, T>> {
        Self::new(data, y * stride + x, stride, width, height)
    }
}

impl<T: BlockDataType> BlockView<T> for ArrayBlockView<'_, T> {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.height && col < self.width);
        self.data[self.offset + row * self.stride + col]
    }
}

/// Mutable counterpart of [`ArrayBlockView`].
pub struct ArrayBlockViewMut<'a, T: BlockDataType> {
    data: &'a mut [T],
    offset: usize,
    stride: usize,
    width: usize,
    height: usize,
}

impl<'a, T: BlockDataType> ArrayBlockViewMut<'a, T> {
    pub fn new(
        data: &'a mut [T],
        offset: usize,
        stride: usize,
        width: usize,
        height: usize,
    ) -> Result<ArrayBlockViewMut<'a, T>> {
        check_window::<T>(data.len(), offset, stride, width, height)?;
        Ok(ArrayBlockViewMut {
            data,
            offset,
            stride,
            width,
            height,
        })
    }

    pub fn window(
        data: &'a mut [T],
        stride: usize,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ArrayBlockViewMut<'a, T>> {
        Self::new(data, y * stride + x, stride, width, height)
    }
}

impl<T: BlockDataType> BlockView<T> for ArrayBlockViewMut<'_, T> {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.height && col < self.width);
        self.data[self.offset + row * self.stride + col]
    }
}

impl<T: BlockDataType> BlockViewMut<T> for ArrayBlockViewMut<'_, T> {
    fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.height && col < self.width);
        self.data[self.offset + row * self.stride + col] = value;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::{map_in_place, to_vec};
    use crate::error::Error;
    use test_log::test;

    #[test]
    fn window_reads_with_stride() -> Result<()> {
        let plane: Vec<u8> = (0..20).collect();
        let view = ArrayBlockView::window(&plane, 5, 1, 2, 3, 2)?;
        assert_eq!(to_vec(&view), vec![11, 12, 13, 16, 17, 18]);
        assert_eq!(view.get_index(3), 16);
        Ok(())
    }

    #[test]
    fn window_off_the_end_fails() {
        let plane = vec![0i32; 20];
        assert!(ArrayBlockView::window(&plane, 5, 3, 3, 2, 1).is_ok());
        assert!(matches!(
            ArrayBlockView::window(&plane, 5, 3, 3, 3, 1),
            Err(Error::InvalidInput(InvalidInput::WindowOutOfBounds { .. }))
        ));
        assert!(ArrayBlockView::window(&plane, 5, 0, 3, 5, 2).is_err());
    }

    #[test]
    fn mutable_window_writes_through() -> Result<()> {
        let mut plane = vec![1.0f32; 16];
        {
            let mut view = ArrayBlockViewMut::window(&mut plane, 4, 2, 2, 2, 2)?;
            map_in_place(&mut view, |row, col, v| v + (row * 2 + col) as f32);
        }
        assert_eq!(&plane[8..], &[1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 3.0, 4.0]);
        Ok(())
    }
}
