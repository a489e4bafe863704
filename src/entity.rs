use std::time::Instant;

use glam::{IVec2, Vec2};

use crate::error::{SimError, SimResult};
use crate::fsm::StateMachine;
use crate::mask::Sprite;
use crate::physics;
use crate::player::Control;
use crate::timer::Timer;
use crate::types::{EntityKind, MAX_STATE_MACHINES, PAL_LENGTH, Palette, PhysicsConfig};

/// A simulated actor: a player or a pickup.
#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub sprite: Sprite,
    pub palette: Palette,
    /// Top-left pixel of the sprite, world space.
    pub pos: Vec2,
    pub vel: Vec2,
    pub acc: Vec2,
    /// Applied force, integrated as an impulse over the same time scale as velocity.
    pub force: Vec2,
    /// Gravity currently applied; switched by the jump state machine.
    pub gravity: f32,
    pub physics: PhysicsConfig,
    pub control: Control,
    pub last_update: Timer,
    /// Time of the tick being simulated. Guards compare timers against it.
    pub clock: Instant,
    machines: Vec<StateMachine<Entity>>,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2, physics: PhysicsConfig, now: Instant) -> Self {
        Self {
            kind,
            sprite: Sprite::EMPTY,
            palette: [0; PAL_LENGTH],
            pos,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            force: Vec2::ZERO,
            gravity: physics.gravity_strong,
            physics,
            control: Control::default(),
            last_update: Timer::started(now),
            clock: now,
            machines: Vec::new(),
        }
    }

    pub fn set_sprite(&mut self, sprite: &Sprite) {
        self.sprite = *sprite;
    }

    pub fn set_palette(&mut self, palette: &Palette) {
        self.palette = *palette;
    }

    /// Append a state machine; machines run in registration order.
    pub fn register_sm(&mut self, sm: StateMachine<Entity>) -> SimResult<()> {
        if self.machines.len() >= MAX_STATE_MACHINES {
            return Err(SimError::CapacityExceeded {
                what: "entity state machines",
                capacity: MAX_STATE_MACHINES,
            });
        }
        self.machines.push(sm);
        Ok(())
    }

    pub fn machines(&self) -> &[StateMachine<Entity>] {
        &self.machines
    }

    /// Run every registered state machine once against this entity.
    pub fn run_machines(&mut self, now: Instant) {
        self.clock = now;
        let mut machines = std::mem::take(&mut self.machines);
        for sm in machines.iter_mut() {
            sm.run(self);
        }
        self.machines = machines;
    }

    /// State machines first, then physics. Returns whether physics advanced.
    pub fn update(&mut self, now: Instant) -> bool {
        self.run_machines(now);
        physics::integrate(self, now)
    }

    /// Pixel the collision checks anchor on: x rounded down, y rounded up.
    pub fn pixel_pos(&self) -> IVec2 {
        pixel_of(self.pos)
    }
}

pub(crate) fn pixel_of(pos: Vec2) -> IVec2 {
    IVec2::new(pos.x.floor() as i32, pos.y.ceil() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::{StateSpec, StateTable};
    use std::sync::Arc;

    fn idle_table() -> Arc<StateTable<Entity>> {
        Arc::new(StateTable::new(vec![StateSpec::new("idle").otherwise(0)]).unwrap())
    }

    #[test]
    fn test_new_entity_is_at_rest() {
        let e = Entity::new(
            EntityKind::Flag,
            Vec2::new(3.0, 4.0),
            PhysicsConfig::default(),
            Instant::now(),
        );
        assert_eq!(e.vel, Vec2::ZERO);
        assert_eq!(e.acc, Vec2::ZERO);
        assert_eq!(e.gravity, -45.0);
        assert!(e.last_update.is_set());
        assert_eq!(e.sprite, Sprite::EMPTY);
    }

    #[test]
    fn test_register_sm_is_bounded() {
        let mut e =
            Entity::new(EntityKind::Player, Vec2::ZERO, PhysicsConfig::default(), Instant::now());
        let t = idle_table();
        for _ in 0..MAX_STATE_MACHINES {
            e.register_sm(StateMachine::new(Arc::clone(&t), 0).unwrap()).unwrap();
        }
        let err = e.register_sm(StateMachine::new(t, 0).unwrap()).unwrap_err();
        assert!(matches!(err, SimError::CapacityExceeded { capacity: 4, .. }));
        assert_eq!(e.machines().len(), MAX_STATE_MACHINES);
    }

    #[test]
    fn test_sprite_and_palette_are_copied() {
        let mut e =
            Entity::new(EntityKind::Flag, Vec2::ZERO, PhysicsConfig::default(), Instant::now());
        let mut pal = [0u32; PAL_LENGTH];
        pal[2] = 0xff00_ff00;
        e.set_sprite(&Sprite::SOLID);
        e.set_palette(&pal);
        pal[2] = 0;
        assert_eq!(e.sprite, Sprite::SOLID);
        assert_eq!(e.palette[2], 0xff00_ff00);
    }

    #[test]
    fn test_pixel_pos_floors_x_and_ceils_y() {
        let mut e = Entity::new(
            EntityKind::Player,
            Vec2::new(-0.5, -96.2),
            PhysicsConfig::default(),
            Instant::now(),
        );
        assert_eq!(e.pixel_pos(), IVec2::new(-1, -96));
        e.pos = Vec2::new(2.9, 3.1);
        assert_eq!(e.pixel_pos(), IVec2::new(2, 4));
    }
}
