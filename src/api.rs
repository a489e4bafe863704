use std::time::Instant;

use glam::Vec2;

use crate::entity::Entity;
use crate::error::SimResult;
use crate::events::EventBus;
use crate::level::{LevelAssets, LevelData};
use crate::mask::Sprite;
use crate::pool::Handle;
use crate::tilemap::TileMap;
use crate::types::*;

/// Public API contract for the platformer simulation.
pub trait SimulationApi {
    /// Construct an empty world with the given configuration.
    fn new(cfg: SimConfig) -> Self
    where
        Self: Sized;

    /// Subscribe the world to key events on `bus`. Idempotent.
    fn subscribe_input(&mut self, bus: &mut EventBus) -> SimResult<()>;

    // --- Population --------------------------------------------------------

    /// Spawn a player with both player state machines attached.
    fn add_player(
        &mut self,
        pos: Vec2,
        sprite: &Sprite,
        palette: &Palette,
        now: Instant,
    ) -> SimResult<Handle>;

    fn remove_player(&mut self, handle: Handle) -> SimResult<Entity>;

    /// Spawn a flag. Flags never move; once animated they show the current
    /// animation frame.
    fn add_flag(
        &mut self,
        pos: Vec2,
        sprite: &Sprite,
        palette: &Palette,
        now: Instant,
    ) -> SimResult<Handle>;

    fn remove_flag(&mut self, handle: Handle) -> SimResult<Entity>;

    /// Remove every player and flag.
    fn clear(&mut self);

    /// Replace the population with the level's players and flags.
    fn load_level(
        &mut self,
        level: &LevelData,
        assets: &LevelAssets,
        now: Instant,
    ) -> SimResult<()>;

    // --- Simulation --------------------------------------------------------

    /// Apply queued input, advance every player to `now`, push players out of
    /// the map and report contacts and the win state.
    fn tick(&mut self, map: &TileMap, bus: &mut EventBus, now: Instant) -> TickReport;

    /// True when every player overlaps the flag with the same index.
    fn check_win(&self) -> bool;
}

/// Bitmap collision signatures to be provided.
pub trait CollisionApi {
    /// Overlap between the entity's sprite mask and the map tiles under it.
    fn check_map(entity: &Entity, map: &TileMap) -> Push;

    /// Walk the entity out of the map one pixel at a time, zeroing velocity
    /// on each axis it is pushed along.
    fn resolve_map(entity: &mut Entity, map: &TileMap, cfg: &CollisionConfig) -> Resolution;

    /// Stop a body that is descending onto a floor one pixel below it.
    fn settle(entity: &mut Entity, map: &TileMap, cfg: &CollisionConfig) -> bool;

    /// Overlap between two entities' sprite masks, in `a`'s sprite frame.
    fn check_entity(a: &Entity, b: &Entity) -> Push;

    /// Contact between two entities, if any. Neither entity is moved.
    fn resolve_entity(a: &Entity, b: &Entity) -> Option<Push>;
}
