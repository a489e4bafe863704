//! tilestep: tile-map platformer simulation (bitmap collision, state-machine players)

pub mod types;
pub mod error;
pub mod api;
pub mod geometry;
pub mod mask;
pub mod tilemap;
pub mod timer;
pub mod fsm;
pub mod entity;
pub mod physics;
pub mod collision;
pub mod player;
pub mod events;
pub mod pool;
pub mod animation;
pub mod pacing;
pub mod level;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{SimError, SimResult};
pub use crate::world::World;
