//! Pixel-space ↔ tile-space mapping.
//!
//! World pixels have their origin at the centre of the grid with y growing
//! upward. Tile indices start at the top-left corner with y growing downward.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::types::TILE_WIDTH;

/// Tile grid dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grid {
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl Default for Grid {
    fn default() -> Self {
        Self { tiles_x: 40, tiles_y: 25 }
    }
}

impl Grid {
    pub fn new(tiles_x: u32, tiles_y: u32) -> Self {
        Self { tiles_x, tiles_y }
    }

    /// Number of cells in one map layer.
    pub fn cells(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Tile containing pixel `(x, y)`. Not bounds-checked.
    pub fn find_tile(&self, x: f32, y: f32) -> IVec2 {
        let tw = TILE_WIDTH as f32;
        IVec2::new(
            (x / tw + self.tiles_x as f32 / 2.0).floor() as i32,
            (self.tiles_y as f32 / 2.0 - y / tw).floor() as i32,
        )
    }

    /// World position of the top-left pixel of `tile`.
    pub fn tile_origin(&self, tile: IVec2) -> Vec2 {
        let tw = TILE_WIDTH as f32;
        Vec2::new(
            tw * (tile.x as f32 - self.tiles_x as f32 / 2.0),
            tw * (self.tiles_y as f32 / 2.0 - tile.y as f32),
        )
    }

    /// Offset of `(x, y)` inside `tile`, rightward and downward from the
    /// tile's top-left pixel.
    pub fn find_offset(&self, x: f32, y: f32, tile: IVec2) -> IVec2 {
        let origin = self.tile_origin(tile);
        IVec2::new((x - origin.x).round() as i32, (origin.y - y).round() as i32)
    }

    /// Inverse of [`find_tile`](Self::find_tile) + [`find_offset`](Self::find_offset).
    pub fn pixel_at(&self, tile: IVec2, offset: IVec2) -> Vec2 {
        self.tile_origin(tile) + Vec2::new(offset.x as f32, -(offset.y as f32))
    }

    /// Row-major cell index, or `None` outside the grid.
    pub fn index(&self, tile: IVec2) -> Option<usize> {
        if tile.x < 0
            || tile.y < 0
            || tile.x >= self.tiles_x as i32
            || tile.y >= self.tiles_y as i32
        {
            return None;
        }
        Some(tile.x as usize + tile.y as usize * self.tiles_x as usize)
    }
}
