use glam::Vec2;
use std::time::Duration;
use tilestep::events::{Event, EventBus, Key};
use tilestep::geometry::Grid;
use tilestep::level::{LevelAssets, LevelData};
use tilestep::mask::Sprite;
use tilestep::pacing::FramePacer;
use tilestep::tilemap::TileMap;
use tilestep::timer::{Clock, ManualClock, MonotonicClock};
use tilestep::*;

fn main() -> Result<(), SimError> {
    let cfg = SimConfig { grid: Grid::new(40, 40), ..Default::default() };
    let mut map = TileMap::filled(cfg.grid, vec![Sprite::EMPTY, Sprite::SOLID]);
    // Floor top at y = -104, flag a little to the right of the spawn
    map.fill_row(33, 1, 0);

    let clock = ManualClock::new(MonotonicClock.now());
    let mut bus = EventBus::new();
    let mut world = World::new(cfg);
    world.subscribe_input(&mut bus)?;
    let level = LevelData {
        players: vec![Vec2::new(0.0, -90.0)],
        flags: vec![Vec2::new(30.0, -96.0)],
    };
    world.load_level(&level, &LevelAssets::default(), clock.now())?;

    let mut pacer = FramePacer::new(world.cfg.target_fps);
    let frame = Duration::from_secs_f64(pacer.budget_ms() / 1000.0);
    for n in 0..600u32 {
        match n {
            10 => bus.publish(Event::KeyDown(Key::Up)),
            18 => bus.publish(Event::KeyUp(Key::Up)),
            60 => bus.publish(Event::KeyDown(Key::Right)),
            _ => {}
        }
        pacer.begin(clock.now());
        clock.advance(frame);
        let report = world.tick(&map, &mut bus, clock.now());
        pacer.record(frame.as_secs_f64() * 1000.0);

        if n % 20 == 0 || report.won {
            for (h, p) in world.players() {
                println!(
                    "tick {:>3} player {:?} pos=({:.2},{:.2}) vel=({:.2},{:.2}) contacts={}",
                    n,
                    h,
                    p.pos.x,
                    p.pos.y,
                    p.vel.x,
                    p.vel.y,
                    report.contacts.len()
                );
            }
        }
        if report.won {
            println!("won after {} ticks ({:.1} fps average)", n + 1, pacer.fps());
            break;
        }
    }
    Ok(())
}
