//! Packed 4bpp sprites and the collision masks derived from them.
//!
//! Each byte holds two pixels: the high nibble is the left pixel, the low
//! nibble the right one. Bit 3 of a nibble marks the pixel solid and the low
//! three bits pick a palette entry, so the solid flag and the colour share
//! storage and must be decoded with fixed masks.

use serde::{Deserialize, Serialize};

use crate::types::{TILE_SIZE, TILE_WIDTH};

const W: usize = TILE_WIDTH as usize;
const LEFT_SOLID: u8 = 0b1000_0000;
const RIGHT_SOLID: u8 = 0b0000_1000;
const NIBBLE_SOLID: u8 = 0b1000;
const NIBBLE_COLOUR: u8 = 0b0111;

/// 8x8 sprite, two pixels per byte, row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite(pub [u8; TILE_SIZE]);

impl Default for Sprite {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Sprite {
    pub const EMPTY: Sprite = Sprite([0; TILE_SIZE]);
    /// Every pixel solid, palette entry 0.
    pub const SOLID: Sprite = Sprite([LEFT_SOLID | RIGHT_SOLID; TILE_SIZE]);

    /// Byte holding pixel `(col, row)`.
    fn byte(&self, col: usize, row: usize) -> u8 {
        self.0[col / 2 + (W / 2) * row]
    }

    /// Raw 4-bit value of pixel `(col, row)`.
    pub fn pixel(&self, col: usize, row: usize) -> u8 {
        let b = self.byte(col, row);
        if col % 2 == 0 { b >> 4 } else { b & 0x0f }
    }

    /// Palette slot used to draw pixel `(col, row)`.
    pub fn palette_index(&self, col: usize, row: usize) -> u8 {
        self.pixel(col, row) & NIBBLE_COLOUR
    }

    pub fn is_solid(&self, col: usize, row: usize) -> bool {
        self.pixel(col, row) & NIBBLE_SOLID != 0
    }

    pub fn mask(&self) -> CollisionMask {
        CollisionMask::from_sprite(self)
    }
}

/// Dense per-pixel solidity grid, indexed `[row][col]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionMask(pub [[bool; W]; W]);

impl CollisionMask {
    pub const EMPTY: CollisionMask = CollisionMask([[false; W]; W]);

    pub fn from_sprite(sprite: &Sprite) -> Self {
        let mut m = [[false; W]; W];
        for (j, row) in m.iter_mut().enumerate() {
            for i in 0..W / 2 {
                let b = sprite.0[i + (W / 2) * j];
                row[2 * i] = b & LEFT_SOLID != 0;
                row[2 * i + 1] = b & RIGHT_SOLID != 0;
            }
        }
        Self(m)
    }

    /// Solidity at `(col, row)`; out-of-range reads are empty.
    pub fn get(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 || col >= TILE_WIDTH || row >= TILE_WIDTH {
            return false;
        }
        self.0[row as usize][col as usize]
    }

    pub fn solid_count(&self) -> usize {
        self.0.iter().flatten().filter(|s| **s).count()
    }
}
