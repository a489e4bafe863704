//! Level layouts and the art they are populated with.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::mask::Sprite;
use crate::types::{PAL_LENGTH, Palette};

/// Spawn points for one level. Flag `i` belongs to player `i`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub players: Vec<Vec2>,
    pub flags: Vec<Vec2>,
}

impl LevelData {
    /// Single player at the origin racing to a flag at (10, 10).
    pub fn first() -> Self {
        Self { players: vec![Vec2::ZERO], flags: vec![Vec2::new(10.0, 10.0)] }
    }
}

/// Sprites and palettes handed to entities spawned by a level.
#[derive(Clone, Debug)]
pub struct LevelAssets {
    pub player_sprite: Sprite,
    pub player_palette: Palette,
    /// Flag animation frames, cycled by the world.
    pub flag_frames: Vec<Sprite>,
    /// Palette per flag index; reused from the start when there are fewer
    /// palettes than flags.
    pub flag_palettes: Vec<Palette>,
}

impl LevelAssets {
    pub fn flag_palette(&self, i: usize) -> Palette {
        if self.flag_palettes.is_empty() {
            return [0; PAL_LENGTH];
        }
        self.flag_palettes[i % self.flag_palettes.len()]
    }
}

impl Default for LevelAssets {
    fn default() -> Self {
        Self {
            player_sprite: Sprite::SOLID,
            player_palette: [0; PAL_LENGTH],
            flag_frames: vec![Sprite::SOLID],
            flag_palettes: Vec::new(),
        }
    }
}
