use glam::{IVec2, Vec2};

use crate::api::CollisionApi;
use crate::entity::{Entity, pixel_of};
use crate::mask::CollisionMask;
use crate::tilemap::TileMap;
use crate::types::*;

const W: i32 = TILE_WIDTH;
const HALF: i32 = TILE_WIDTH / 2;

/// Bitmap overlap tests between entity sprites and the tile map.
pub struct Collision;

/// Vote cast by one overlapping pixel: toward the half of the sprite it lies
/// in, x rightward and y downward in sprite space.
fn vote(col: i32, row: i32) -> Vec2 {
    Vec2::new(
        (1 - 2 * (col < HALF) as i32) as f32,
        (1 - 2 * (row < HALF) as i32) as f32,
    )
}

fn push_from(direction: Vec2, votes: u32) -> Push {
    Push { direction: direction.normalize_or_zero() * votes as f32, votes }
}

impl CollisionApi for Collision {
    fn check_map(entity: &Entity, map: &TileMap) -> Push {
        Self::check_map_at(&entity.sprite.mask(), entity.pixel_pos(), map)
    }

    fn resolve_map(entity: &mut Entity, map: &TileMap, cfg: &CollisionConfig) -> Resolution {
        let mask = entity.sprite.mask();
        let start = entity.pos;
        let mut push = Self::check_map_at(&mask, pixel_of(entity.pos), map);
        if !push.overlaps() {
            return Resolution::Clear;
        }

        let mut steps = 0;
        while push.overlaps() {
            if steps >= cfg.max_resolve_steps {
                return Self::snap(entity, &mask, map, cfg, start, steps);
            }
            let d = push.direction;
            // Pixel rows grow downward, world y grows upward. Votes that
            // cancel out count as a y tie and lift the entity.
            if d.y.abs() >= d.x.abs() {
                entity.pos.y += if d.y >= 0.0 { 1.0 } else { -1.0 };
                entity.vel.y = 0.0;
            } else {
                entity.pos.x += if d.x > 0.0 { -1.0 } else { 1.0 };
                entity.vel.x = 0.0;
            }
            steps += 1;
            log::trace!("resolve step {steps}: push {d:?} -> pos {:?}", entity.pos);
            push = Self::check_map_at(&mask, pixel_of(entity.pos), map);
        }
        Resolution::Resolved { steps }
    }

    fn settle(entity: &mut Entity, map: &TileMap, cfg: &CollisionConfig) -> bool {
        if !cfg.settle_on_ground || entity.vel.y > 0.0 {
            return false;
        }
        let below = entity.pixel_pos() - IVec2::Y;
        let underfoot = Self::check_map_at(&entity.sprite.mask(), below, map);
        if underfoot.direction.y <= 0.0 {
            return false;
        }
        entity.pos.y = entity.pos.y.ceil();
        entity.vel.y = 0.0;
        true
    }

    fn check_entity(a: &Entity, b: &Entity) -> Push {
        let d = b.pos - a.pos;
        // Truncate toward zero
        let off = IVec2::new(d.x as i32, d.y as i32);
        if off.x.abs() >= W || off.y.abs() >= W {
            return Push::default();
        }

        let ma = a.sprite.mask();
        let mb = b.sprite.mask();
        let (mut direction, mut votes) = (Vec2::ZERO, 0);
        // Walk a's pixels that b also covers; b sits `off` right and up of a
        for ja in 0i32.max(-off.y)..W.min(W - off.y) {
            for ia in 0i32.max(off.x)..W.min(W + off.x) {
                if ma.get(ia, ja) && mb.get(ia - off.x, ja + off.y) {
                    direction += vote(ia, ja);
                    votes += 1;
                }
            }
        }
        push_from(direction, votes)
    }

    fn resolve_entity(a: &Entity, b: &Entity) -> Option<Push> {
        let push = Self::check_entity(a, b);
        push.overlaps().then_some(push)
    }
}

impl Collision {
    /// Map check for `mask` with its top-left pixel at `at`.
    ///
    /// Looks at the tile containing `at` and the three tiles right, below and
    /// diagonally below-right of it, which together cover any 8x8 footprint.
    pub fn check_map_at(mask: &CollisionMask, at: IVec2, map: &TileMap) -> Push {
        let g = &map.grid;
        let (x, y) = (at.x as f32, at.y as f32);
        let tile = g.find_tile(x, y);
        let offset = g.find_offset(x, y, tile);

        // {top-left, top-right, bottom-left, bottom-right}
        let mut quads = [CollisionMask::EMPTY; 4];
        for ud in 0..2 {
            for lr in 0..2 {
                let t = g.find_tile(x + (lr * W) as f32, y - (ud * W) as f32);
                quads[(2 * ud + lr) as usize] = map.mask_at(t);
            }
        }

        let (mut direction, mut votes) = (Vec2::ZERO, 0);
        for j in 0..W {
            for i in 0..W {
                if !mask.get(i, j) {
                    continue;
                }
                let ud = (offset.y + j >= W) as i32;
                let lr = (offset.x + i >= W) as i32;
                let quad = &quads[(2 * ud + lr) as usize];
                if quad.get(i + offset.x - W * lr, j + offset.y - W * ud) {
                    direction += vote(i, j);
                    votes += 1;
                }
            }
        }
        push_from(direction, votes)
    }

    /// Step-cap fallback: move to the overlap-free pixel offset from `start`
    /// closest to it, or put the entity back if there is none in range.
    fn snap(
        entity: &mut Entity,
        mask: &CollisionMask,
        map: &TileMap,
        cfg: &CollisionConfig,
        start: Vec2,
        steps: u32,
    ) -> Resolution {
        let anchor = pixel_of(start);
        let r = cfg.snap_radius.max(0);
        let mut best: Option<IVec2> = None;
        for dy in -r..=r {
            for dx in -r..=r {
                let off = IVec2::new(dx, dy);
                if off == IVec2::ZERO {
                    continue;
                }
                if best.is_some_and(|b| b.length_squared() <= off.length_squared()) {
                    continue;
                }
                if !Self::check_map_at(mask, anchor + off, map).overlaps() {
                    best = Some(off);
                }
            }
        }

        match best {
            Some(off) => {
                entity.pos = start + off.as_vec2();
                if off.x != 0 {
                    entity.vel.x = 0.0;
                }
                if off.y != 0 {
                    entity.vel.y = 0.0;
                }
                log::warn!("resolution capped after {steps} steps, snapped by {off:?}");
                Resolution::Snapped { steps, offset: off }
            }
            None => {
                log::warn!(
                    "resolution capped after {steps} steps with no free position within {r}px"
                );
                entity.pos = start;
                entity.vel = Vec2::ZERO;
                Resolution::Stuck { steps }
            }
        }
    }
}
