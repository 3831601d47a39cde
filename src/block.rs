// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Two-dimensional views over typed sample buffers.
//!
//! Every transform in the codec reads and writes through [`BlockView`] and
//! [`BlockViewMut`]. Adapters in the submodules change how cells map onto the
//! backing storage (windows, edge replication, zero padding, tiling and
//! resampling); traversal lives in the free functions below.

use std::fmt::Debug;

mod array;
mod composite;
mod data;
mod extended;
mod padded;
mod sampling;

pub use array::{ArrayBlockView, ArrayBlockViewMut};
pub use composite::CompositeView;
pub use data::BlockData;
pub use extended::EdgeExtendedView;
pub use padded::ZeroPaddedView;
pub use sampling::{BilinearView, NearestNeighborView};

mod private {
    pub trait Sealed {}
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DataTypeTag {
    U8,
    I32,
    F32,
}

pub trait BlockDataType: private::Sealed + Copy + Default + 'static + Debug + PartialEq {
    /// ID of this data type. Different types *must* have different values.
    const DATA_TYPE_ID: DataTypeTag;

    /// Converts from a float, rounding half away from zero and saturating
    /// for integer types.
    fn from_f64(f: f64) -> Self;
    fn to_f64(self) -> f64;
}

macro_rules! impl_integer_data_type {
    ($ty: ty, $id: ident) => {
        impl private::Sealed for $ty {}
        impl BlockDataType for $ty {
            const DATA_TYPE_ID: DataTypeTag = DataTypeTag::$id;
            fn from_f64(f: f64) -> $ty {
                f.round() as $ty
            }
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_integer_data_type!(u8, U8);
impl_integer_data_type!(i32, I32);

impl private::Sealed for f32 {}
impl BlockDataType for f32 {
    const DATA_TYPE_ID: DataTypeTag = DataTypeTag::F32;
    fn from_f64(f: f64) -> f32 {
        f as f32
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Read access to a `width x height` grid of cells.
///
/// Accessing a cell outside the grid panics, like slice indexing.
pub trait BlockView<T: BlockDataType> {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> T;

    /// Row-major linear access.
    fn get_index(&self, index: usize) -> T {
        self.get(index / self.width(), index % self.width())
    }
}

/// Write access to a view. Adapters that present more cells than they
/// store may silently drop writes to the synthetic cells.
pub trait BlockViewMut<T: BlockDataType>: BlockView<T> {
    fn set(&mut self, row: usize, col: usize, value: T);

    fn set_index(&mut self, index: usize, value: T) {
        let width = self.width();
        self.set(index / width, index % width, value);
    }
}

impl<T: BlockDataType, V: BlockView<T> + ?Sized> BlockView<T> for &V {
    fn width(&self) -> usize {
        (**self).width()
    }
    fn height(&self) -> usize {
        (**self).height()
    }
    fn get(&self, row: usize, col: usize) -> T {
        (**self).get(row, col)
    }
}

impl<T: BlockDataType, V: BlockView<T> + ?Sized> BlockView<T> for &mut V {
    fn width(&self) -> usize {
        (**self).width()
    }
    fn height(&self) -> usize {
        (**self).height()
    }
    fn get(&self, row: usize, col: usize) -> T {
        (**self).get(row, col)
    }
}

impl<T: BlockDataType, V: BlockViewMut<T> + ?Sized> BlockViewMut<T> for &mut V {
    fn set(&mut self, row: usize, col: usize, value: T) {
        (**self).set(row, col, value)
    }
}

impl<T: BlockDataType, V: BlockView<T> + ?Sized> BlockView<T> for Box<V> {
    fn width(&self) -> usize {
        (**self).width()
    }
    fn height(&self) -> usize {
        (**self).height()
    }
    fn get(&self, row: usize, col: usize) -> T {
        (**self).get(row, col)
    }
}

/// Calls `f(row, col, value)` for every cell in row-major order.
pub fn for_each_cell<T, V>(view: &V, mut f: impl FnMut(usize, usize, T))
where
    T: BlockDataType,
    V: BlockView<T> + ?Sized,
{
    for row in 0..view.height() {
        for col in 0..view.width() {
            f(row, col, view.get(row, col));
        }
    }
}

/// Replaces every cell with `f(row, col, value)`.
pub fn map_in_place<T, V>(view: &mut V, mut f: impl FnMut(usize, usize, T) -> T)
where
    T: BlockDataType,
    V: BlockViewMut<T> + ?Sized,
{
    for row in 0..view.height() {
        for col in 0..view.width() {
            let value = view.get(row, col);
            view.set(row, col, f(row, col, value));
        }
    }
}

/// Copies the overlapping top-left region of `src` into `dst`.
pub fn copy_into<T, S, D>(src: &S, dst: &mut D)
where
    T: BlockDataType,
    S: BlockView<T> + ?Sized,
    D: BlockViewMut<T> + ?Sized,
{
    let height = src.height().min(dst.height());
    let width = src.width().min(dst.width());
    for row in 0..height {
        for col in 0..width {
            dst.set(row, col, src.get(row, col));
        }
    }
}

/// Collects the view into a row-major vector.
pub fn to_vec<T, V>(view: &V) -> Vec<T>
where
    T: BlockDataType,
    V: BlockView<T> + ?Sized,
{
    let mut out = Vec::with_capacity(view.width() * view.height());
    for_each_cell(view, |_, _, v| out.push(v));
    out
}

/// Converts every cell to another element type through `f64`.
pub fn convert<T, U, V>(view: &V) -> BlockData<U>
where
    T: BlockDataType,
    U: BlockDataType,
    V: BlockView<T> + ?Sized,
{
    BlockData::from_fn(view.width(), view.height(), |row, col| {
        U::from_f64(view.get(row, col).to_f64())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use arbtest::arbitrary::Arbitrary;
    use test_log::test;

    fn f64_conversions<T: BlockDataType + Eq + for<'a> Arbitrary<'a>>() {
        arbtest::arbtest(|u| {
            let t = T::arbitrary(u)?;
            assert_eq!(t, T::from_f64(t.to_f64()));
            Ok(())
        });
    }

    #[test]
    fn u8_f64_conv() {
        f64_conversions::<u8>();
    }

    #[test]
    fn i32_f64_conv() {
        f64_conversions::<i32>();
    }

    #[test]
    fn f32_f64_conv() {
        arbtest::arbtest(|u| {
            let t = f32::arbitrary(u)?;
            if !t.is_nan() {
                assert_eq!(t, f32::from_f64(t.to_f64()));
            }
            Ok(())
        });
    }

    #[test]
    fn from_f64_rounds_and_saturates() {
        assert_eq!(u8::from_f64(254.5), 255);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(i32::from_f64(-2.5), -3);
        assert_eq!(i32::from_f64(2.4), 2);
        assert_eq!(f32::from_f64(0.25), 0.25);
    }

    #[test]
    fn traversal_helpers() {
        let mut block = BlockData::from_fn(3, 2, |row, col| (row * 3 + col) as i32);
        assert_eq!(to_vec(&block), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(block.get_index(4), 4);

        map_in_place(&mut block, |_, _, v| v * 10);
        assert_eq!(to_vec(&block), vec![0, 10, 20, 30, 40, 50]);

        let mut cells = vec![];
        for_each_cell(&block, |row, col, v| cells.push((row, col, v)));
        assert_eq!(cells[5], (1, 2, 50));

        let mut small = BlockData::<i32>::new(2, 2);
        copy_into(&block, &mut small);
        assert_eq!(to_vec(&small), vec![0, 10, 30, 40]);

        small.set_index(3, -7);
        assert_eq!(small.get(1, 1), -7);
    }

    #[test]
    fn convert_rounds_into_integer_views() {
        let floats = BlockData::from_fn(2, 1, |_, col| [1.5f32, -0.4][col]);
        let ints: BlockData<i32> = convert(&floats);
        assert_eq!(to_vec(&ints), vec![2, 0]);
        let bytes: BlockData<u8> = convert(&floats);
        assert_eq!(to_vec(&bytes), vec![2, 0]);
    }
}
