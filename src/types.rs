use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::Grid;
use crate::pool::Handle;

/// Width and height of a tile (and of every entity sprite) in pixels.
pub const TILE_WIDTH: i32 = 8;
/// Bytes in a packed 8x8 sprite (two 4-bit pixels per byte).
pub const TILE_SIZE: usize = 32;
/// Colours per palette.
pub const PAL_LENGTH: usize = 8;
/// State machines one entity can drive.
pub const MAX_STATE_MACHINES: usize = 4;
/// Transitions per state, fallback included.
pub const MAX_TRANSITIONS: usize = 5;
/// Subscribers per event topic.
pub const MAX_SUBSCRIBERS: usize = 16;

/// ARGB colours indexed by the low three bits of a pixel nibble.
pub type Palette = [u32; PAL_LENGTH];

/// Entity discriminator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Flag,
}

/// Overlap result shared by the map and entity checks.
///
/// `direction` points toward the side of the entity sprite holding most of
/// the overlapping pixels; its length equals `votes`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Push {
    pub direction: Vec2,
    /// Number of overlapping solid pixel pairs.
    pub votes: u32,
}

impl Push {
    /// True when the votes leave no direction to push in. Cancelling votes
    /// still overlap; see [`Push::overlaps`].
    pub fn is_clear(&self) -> bool {
        self.direction.x == 0.0 && self.direction.y == 0.0
    }

    /// True when any solid pixels coincide, even if their votes cancel.
    pub fn overlaps(&self) -> bool {
        self.votes > 0
    }
}

/// Outcome of a map de-penetration walk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// No overlap on entry.
    Clear,
    /// Walked out one pixel at a time.
    Resolved { steps: u32 },
    /// Step cap hit; moved to the nearest free pixel offset instead.
    Snapped { steps: u32, offset: IVec2 },
    /// Step cap hit and no free offset in range; position restored.
    Stuck { steps: u32 },
}

/// Entity-vs-entity overlap observed during a tick.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    pub a: Handle,
    pub b: Handle,
    pub push: Push,
}

/// Everything a tick decided, for the caller to render or inspect.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub resolutions: Vec<(Handle, Resolution)>,
    pub contacts: Vec<Contact>,
    pub won: bool,
}

/// Per-entity motion tuning. Units are pixels and seconds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub mass: f32,
    /// Gravity while falling or standing.
    pub gravity_strong: f32,
    /// Gravity while a jump is held.
    pub gravity_weak: f32,
    pub max_vx: f32,
    pub max_vy: f32,
    /// Horizontal damping applied when no horizontal acceleration is set.
    pub friction: f32,
    pub jump_speed: f32,
    /// Hard ceiling on ascent time regardless of the jump key.
    pub max_jump_secs: f64,
    /// Horizontal acceleration set by the arrow keys.
    pub player_accel: f32,
    /// Speed at which a player counts as moving.
    pub move_threshold: f32,
    /// Vertical speed below which a falling player counts as landed.
    pub rest_epsilon: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            gravity_strong: -45.0,
            gravity_weak: -35.0,
            max_vx: 25.0,
            max_vy: 50.0,
            friction: 3.0,
            jump_speed: 40.0,
            max_jump_secs: 0.2,
            player_accel: 35.0,
            move_threshold: 1.0,
            rest_epsilon: 1e-3,
        }
    }
}

/// Map resolution limits.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// One-pixel moves allowed before falling back to a snap.
    pub max_resolve_steps: u32,
    /// Chebyshev radius searched by the snap fallback.
    pub snap_radius: i32,
    /// Snap a body resting on a floor onto its pixel row and stop it.
    pub settle_on_ground: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            max_resolve_steps: 16,
            snap_radius: TILE_WIDTH,
            settle_on_ground: true,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid: Grid,
    pub physics: PhysicsConfig,
    pub collision: CollisionConfig,
    /// Concurrent entities of one kind.
    pub pool_capacity: usize,
    /// Seconds per flag animation frame.
    pub flag_frame_secs: f64,
    pub target_fps: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            physics: PhysicsConfig::default(),
            collision: CollisionConfig::default(),
            pool_capacity: 4,
            flag_frame_secs: 0.1,
            target_fps: 60.0,
        }
    }
}
