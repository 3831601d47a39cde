// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{InvalidInput, Result};

use super::{BlockDataType, BlockView, BlockViewMut};

/// Tiles equally sized views row-major into one larger view, `across` tiles
/// per row.
#[derive(Clone, Debug)]
pub struct CompositeView<V> {
    tiles: Vec<V>,
    across: usize,
    tile_width: usize,
    tile_height: usize,
}

impl<V> CompositeView<V> {
    pub fn new<T: BlockDataType>(tiles: Vec<V>, across: usize) -> Result<Self>
    where
        V: BlockView<T>,
    {
        if tiles.is_empty() || across == 0 || tiles.len() % across != 0 {
            return Err(InvalidInput::TileCount {
                tiles: tiles.len(),
                across,
            }
            .into());
        }
        let tile_width = tiles[0].width();
        let tile_height = tiles[0].height();
        for (index, tile) in tiles.iter().enumerate() {
            if tile.width() != tile_width || tile.height() != tile_height {
                return Err(InvalidInput::TileSize {
                    index,
                    width: tile.width(),
                    height: tile.height(),
                    expected_width: tile_width,
                    expected_height: tile_height,
                }
                .into());
            }
        }
        Ok(CompositeView {
            tiles,
            across,
            tile_width,
            tile_height,
        })
    }

    pub fn tiles(&self) -> &[V] {
        &self.tiles
    }

    fn locate(&self, row: usize, col: usize) -> (usize, usize, usize) {
        let tile = (row / self.tile_height) * self.across + col / self.tile_width;
        (tile, row % self.tile_height, col % self.tile_width)
    }
}

impl<T: BlockDataType, V: BlockView<T>> BlockView<T> for CompositeView<V> {
    fn width(&self) -> usize {
        self.across * self.tile_width
    }
    fn height(&self) -> usize {
        (self.tiles.len() / self.across) * self.tile_height
    }
    fn get(&self, row: usize, col: usize) -> T {
        assert!(col < self.width());
        let (tile, row, col) = self.locate(row, col);
        self.tiles[tile].get(row, col)
    }
}

impl<T: BlockDataType, V: BlockViewMut<T>> BlockViewMut<T> for CompositeView<V> {
    fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(col < self.width());
        let (tile, row, col) = self.locate(row, col);
        self.tiles[tile].set(row, col, value);
    }
}
