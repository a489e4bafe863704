//! Player control: key handling and the two player state machines.
//!
//! The motion machine tracks whether a player is moving. The jump machine
//! drives ascent and descent: a requested jump launches the player under
//! weak gravity until the jump key is released or the jump timer runs out,
//! after which strong gravity brings it back down.

use std::sync::Arc;

use glam::Vec2;

use crate::entity::Entity;
use crate::error::SimResult;
use crate::events::Key;
use crate::fsm::{StateId, StateMachine, StateSpec, StateTable};
use crate::timer::Timer;

/// Input-driven flags read by the jump machine.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Control {
    pub jump_requested: bool,
    pub jump_held: bool,
    pub airborne: bool,
    pub jump_timer: Timer,
}

pub mod motion {
    use super::StateId;
    pub const IDLE: StateId = 0;
    pub const MOVING: StateId = 1;
}

pub mod jump {
    use super::StateId;
    pub const IDLE: StateId = 0;
    pub const JUMPING: StateId = 1;
    pub const FALLING: StateId = 2;
}

pub fn on_key_down(e: &mut Entity, key: Key) {
    match key {
        Key::Left => e.acc.x = -e.physics.player_accel,
        Key::Right => e.acc.x = e.physics.player_accel,
        Key::Up => {
            // Auto-repeat must not queue another jump
            if !e.control.jump_held {
                e.control.jump_requested = true;
            }
            e.control.jump_held = true;
        }
        _ => {}
    }
}

pub fn on_key_up(e: &mut Entity, key: Key) {
    match key {
        Key::Left | Key::Right => e.acc.x = 0.0,
        Key::Up => {
            e.control.jump_held = false;
            e.control.jump_requested = false;
        }
        _ => {}
    }
}

fn is_moving(_: &StateMachine<Entity>, e: &Entity) -> bool {
    let t = e.physics.move_threshold;
    e.vel.x.abs() >= t || e.vel.y.abs() >= t
}

fn is_stationary(sm: &StateMachine<Entity>, e: &Entity) -> bool {
    !is_moving(sm, e)
}

fn jump_requested(_: &StateMachine<Entity>, e: &Entity) -> bool {
    e.control.jump_requested
}

fn jump_over(_: &StateMachine<Entity>, e: &Entity) -> bool {
    if !e.control.jump_held {
        return true;
    }
    e.control
        .jump_timer
        .elapsed_secs(e.clock)
        .map_or(true, |s| s >= e.physics.max_jump_secs)
}

fn landed(sm: &StateMachine<Entity>, e: &Entity) -> bool {
    sm.current() != jump::JUMPING && e.vel.y.abs() < e.physics.rest_epsilon
}

fn start_jump(e: &mut Entity) {
    e.vel.y = e.physics.jump_speed;
    e.gravity = e.physics.gravity_weak;
    e.control.airborne = true;
    e.control.jump_requested = false;
    e.control.jump_timer.set(e.clock);
}

fn start_fall(e: &mut Entity) {
    e.force = Vec2::ZERO;
    e.gravity = e.physics.gravity_strong;
    e.control.jump_timer.clear();
}

fn land(e: &mut Entity) {
    e.control.airborne = false;
}

/// Both player tables, built once and shared by every player.
#[derive(Clone)]
pub struct PlayerTables {
    pub motion: Arc<StateTable<Entity>>,
    pub jump: Arc<StateTable<Entity>>,
}

impl PlayerTables {
    pub fn new() -> SimResult<Self> {
        let motion = StateTable::<Entity>::new(vec![
            StateSpec::new("idle").when(is_moving, motion::MOVING).otherwise(motion::IDLE),
            StateSpec::new("moving").when(is_stationary, motion::IDLE).otherwise(motion::MOVING),
        ])?;
        let jump = StateTable::<Entity>::new(vec![
            StateSpec::new("idle")
                .on_entry(land)
                .when(jump_requested, jump::JUMPING)
                .otherwise(jump::IDLE),
            StateSpec::new("jumping")
                .on_entry(start_jump)
                .when(jump_over, jump::FALLING)
                .otherwise(jump::JUMPING),
            StateSpec::new("falling")
                .on_entry(start_fall)
                .when(landed, jump::IDLE)
                .otherwise(jump::FALLING),
        ])?;
        Ok(Self { motion: Arc::new(motion), jump: Arc::new(jump) })
    }

    /// Give `e` a jump machine followed by a motion machine, both idle.
    pub fn attach(&self, e: &mut Entity) -> SimResult<()> {
        e.register_sm(StateMachine::new(Arc::clone(&self.jump), jump::IDLE)?)?;
        e.register_sm(StateMachine::new(Arc::clone(&self.motion), motion::IDLE)?)?;
        Ok(())
    }
}
