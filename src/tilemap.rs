//! Static level geometry: two parallel cell layers and the sprite sheet the
//! sprite layer indexes into.

use glam::IVec2;

use crate::error::{SimError, SimResult};
use crate::geometry::Grid;
use crate::mask::{CollisionMask, Sprite};

/// Read-only tile map for one level.
///
/// Layer 0 holds a sprite index per cell, layer 1 a palette index per cell,
/// both row-major over `grid`.
#[derive(Clone, Debug)]
pub struct TileMap {
    pub grid: Grid,
    sprites: Vec<u8>,
    palettes: Vec<u8>,
    sheet: Vec<Sprite>,
}

impl TileMap {
    pub fn new(
        grid: Grid,
        sprites: Vec<u8>,
        palettes: Vec<u8>,
        sheet: Vec<Sprite>,
    ) -> SimResult<Self> {
        let expected = grid.cells();
        for (layer, len) in [(0, sprites.len()), (1, palettes.len())] {
            if len != expected {
                return Err(SimError::MapSize { layer, expected, actual: len });
            }
        }
        Ok(Self { grid, sprites, palettes, sheet })
    }

    /// Map where every cell uses sprite 0 and palette 0.
    pub fn filled(grid: Grid, sheet: Vec<Sprite>) -> Self {
        let n = grid.cells();
        Self { grid, sprites: vec![0; n], palettes: vec![0; n], sheet }
    }

    pub fn set(&mut self, tile: IVec2, sprite: u8, palette: u8) {
        if let Some(i) = self.grid.index(tile) {
            self.sprites[i] = sprite;
            self.palettes[i] = palette;
        }
    }

    /// Set every cell of row `y` to `sprite`.
    pub fn fill_row(&mut self, y: i32, sprite: u8, palette: u8) {
        for x in 0..self.grid.tiles_x as i32 {
            self.set(IVec2::new(x, y), sprite, palette);
        }
    }

    pub fn sprite_layer(&self) -> &[u8] {
        &self.sprites
    }

    pub fn palette_layer(&self) -> &[u8] {
        &self.palettes
    }

    pub fn sheet(&self) -> &[Sprite] {
        &self.sheet
    }

    /// Sprite drawn at `tile`, if the tile is on the grid and its index is in
    /// the sheet.
    pub fn sprite_at(&self, tile: IVec2) -> Option<&Sprite> {
        let i = self.grid.index(tile)?;
        self.sheet.get(self.sprites[i] as usize)
    }

    pub fn palette_at(&self, tile: IVec2) -> Option<u8> {
        self.grid.index(tile).map(|i| self.palettes[i])
    }

    /// Collision mask for `tile`. Cells off the grid or with a missing sprite
    /// are empty.
    pub fn mask_at(&self, tile: IVec2) -> CollisionMask {
        match self.sprite_at(tile) {
            Some(s) => s.mask(),
            None => CollisionMask::EMPTY,
        }
    }
}
