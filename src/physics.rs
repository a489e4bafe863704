//! Per-entity motion integration.
//!
//! Time is measured in milliseconds since the entity's last step and the
//! step scale is its reciprocal. Applied force is folded into acceleration as
//! an impulse over that same scale rather than integrated over time.

use std::time::Instant;

use crate::entity::Entity;

/// Advance `entity` to `now`. Returns `false` without touching anything when
/// no time has passed or the clock went backwards.
pub fn integrate(entity: &mut Entity, now: Instant) -> bool {
    let dt = match entity.last_update.elapsed_millis(now) {
        Ok(dt) => dt,
        Err(_) => {
            entity.last_update.set(now);
            return false;
        }
    };
    if dt <= 0.0 {
        return false;
    }

    let p = entity.physics;
    let scale = (1.0 / dt) as f32;

    entity.acc.y = entity.gravity / p.mass + entity.force.y * scale / p.mass;

    entity.vel += entity.acc * scale;
    entity.vel.y = limit(entity.vel.y, p.max_vy);

    entity.pos += entity.vel * scale;

    // Damping can overshoot past zero for large scales
    if entity.acc.x == 0.0 {
        entity.vel.x *= 1.0 - p.friction * scale;
    }
    entity.vel.x = limit(entity.vel.x, p.max_vx);

    entity.last_update.set(now);
    true
}

/// Clamp `v` to `[-max, max]`.
fn limit(v: f32, max: f32) -> f32 {
    v.max(-max).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Timer;
    use crate::types::{EntityKind, PhysicsConfig};
    use glam::Vec2;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(16);

    fn body(now: Instant) -> Entity {
        Entity::new(EntityKind::Player, Vec2::ZERO, PhysicsConfig::default(), now)
    }

    #[test]
    fn test_same_timestamp_is_noop() {
        let t0 = Instant::now();
        let mut e = body(t0);
        e.vel.x = 5.0;
        assert!(integrate(&mut e, t0 + TICK));
        let (pos, vel, acc) = (e.pos, e.vel, e.acc);
        assert!(!integrate(&mut e, t0 + TICK));
        assert_eq!((e.pos, e.vel, e.acc), (pos, vel, acc));
    }

    #[test]
    fn test_backwards_clock_is_noop() {
        let t0 = Instant::now();
        let mut e = body(t0 + TICK);
        assert!(!integrate(&mut e, t0));
        assert_eq!(e.pos, Vec2::ZERO);
        assert_eq!(e.last_update, Timer::started(t0 + TICK));
    }

    #[test]
    fn test_unset_timer_arms_and_skips() {
        let t0 = Instant::now();
        let mut e = body(t0);
        e.last_update.clear();
        assert!(!integrate(&mut e, t0 + TICK));
        assert!(e.last_update.is_set());
        assert!(integrate(&mut e, t0 + TICK * 2));
    }

    #[test]
    fn test_gravity_step() {
        let t0 = Instant::now();
        let mut e = body(t0);
        integrate(&mut e, t0 + TICK);
        let scale = 1.0 / 16.0;
        assert!((e.acc.y + 45.0).abs() < 1e-4);
        assert!((e.vel.y + 45.0 * scale).abs() < 1e-4);
        assert!((e.pos.y + 45.0 * scale * scale).abs() < 1e-4);
        assert_eq!(e.pos.x, 0.0);
    }

    #[test]
    fn test_force_adds_impulse() {
        let t0 = Instant::now();
        let mut e = body(t0);
        e.force.y = 160.0;
        integrate(&mut e, t0 + TICK);
        // -45 + 160 / 16
        assert!((e.acc.y + 35.0).abs() < 1e-4);
    }

    #[test]
    fn test_friction_only_without_horizontal_acceleration() {
        let t0 = Instant::now();
        let mut coasting = body(t0);
        coasting.vel.x = 10.0;
        integrate(&mut coasting, t0 + TICK);
        assert!((coasting.vel.x - 10.0 * (1.0 - 3.0 / 16.0)).abs() < 1e-4);

        let mut pushed = body(t0);
        pushed.vel.x = 10.0;
        pushed.acc.x = 16.0;
        integrate(&mut pushed, t0 + TICK);
        assert!((pushed.vel.x - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_limits() {
        let t0 = Instant::now();
        let mut e = body(t0);
        e.vel = Vec2::new(-100.0, -100.0);
        e.acc.x = -1.0;
        integrate(&mut e, t0 + TICK);
        assert_eq!(e.vel.x, -25.0);
        assert_eq!(e.vel.y, -50.0);
    }
}
