use glam::Vec2;

use std::time::Instant;

use crate::animation::SpriteAnimation;
use crate::api::{CollisionApi, SimulationApi};
use crate::collision::Collision;
use crate::entity::Entity;
use crate::error::{SimError, SimResult};
use crate::events::{Event, EventBus, SubscriberId, Subscription, Topic};
use crate::level::{LevelAssets, LevelData};
use crate::mask::Sprite;
use crate::player::{self, PlayerTables};
use crate::pool::{Handle, Pool};
use crate::tilemap::TileMap;
use crate::types::*;

/// Identity the world subscribes to input topics under.
pub const INPUT_SUBSCRIBER: SubscriberId = SubscriberId(0);

/// Players, flags and everything that moves them between ticks.
pub struct World {
    pub cfg: SimConfig,
    pub tick_counter: u32,

    players: Pool<Entity>,
    flags: Pool<Entity>,
    // Built on first player spawn, shared by all players afterwards
    tables: Option<PlayerTables>,
    flag_anim: SpriteAnimation,

    input: Vec<Subscription>,
    won: bool,
}

impl SimulationApi for World {
    fn new(cfg: SimConfig) -> Self {
        let cap = cfg.pool_capacity;
        let flag_anim = SpriteAnimation::new(Vec::new(), cfg.flag_frame_secs);
        Self {
            cfg,
            tick_counter: 0,
            players: Pool::new("player", cap),
            flags: Pool::new("flag", cap),
            tables: None,
            flag_anim,
            input: Vec::new(),
            won: false,
        }
    }

    fn subscribe_input(&mut self, bus: &mut EventBus) -> SimResult<()> {
        if !self.input.is_empty() {
            return Ok(());
        }
        let down = bus.subscribe(Topic::KeyDown, INPUT_SUBSCRIBER)?;
        let up = match bus.subscribe(Topic::KeyUp, INPUT_SUBSCRIBER) {
            Ok(s) => s,
            Err(e) => {
                bus.unsubscribe(down);
                return Err(e);
            }
        };
        self.input = vec![down, up];
        Ok(())
    }

    fn add_player(
        &mut self,
        pos: Vec2,
        sprite: &Sprite,
        palette: &Palette,
        now: Instant,
    ) -> SimResult<Handle> {
        if self.players.len() >= self.players.capacity() {
            return Err(SimError::CapacityExceeded {
                what: "player",
                capacity: self.players.capacity(),
            });
        }
        let tables = match &self.tables {
            Some(t) => t.clone(),
            None => {
                let t = PlayerTables::new()?;
                self.tables = Some(t.clone());
                t
            }
        };
        let mut e = Entity::new(EntityKind::Player, pos, self.cfg.physics, now);
        e.set_sprite(sprite);
        e.set_palette(palette);
        tables.attach(&mut e)?;
        let h = self.players.insert(e)?;
        log::debug!("player {h:?} spawned at {pos:?}");
        Ok(h)
    }

    fn remove_player(&mut self, handle: Handle) -> SimResult<Entity> {
        self.players.remove(handle)
    }

    fn add_flag(
        &mut self,
        pos: Vec2,
        sprite: &Sprite,
        palette: &Palette,
        now: Instant,
    ) -> SimResult<Handle> {
        let mut e = Entity::new(EntityKind::Flag, pos, self.cfg.physics, now);
        e.set_sprite(sprite);
        e.set_palette(palette);
        let h = self.flags.insert(e)?;
        log::debug!("flag {h:?} placed at {pos:?}");
        Ok(h)
    }

    fn remove_flag(&mut self, handle: Handle) -> SimResult<Entity> {
        self.flags.remove(handle)
    }

    fn clear(&mut self) {
        self.players.clear();
        self.flags.clear();
        self.won = false;
    }

    fn load_level(
        &mut self,
        level: &LevelData,
        assets: &LevelAssets,
        now: Instant,
    ) -> SimResult<()> {
        let cap = self.cfg.pool_capacity;
        if level.players.len() > cap {
            return Err(SimError::CapacityExceeded { what: "player", capacity: cap });
        }
        if level.flags.len() > cap {
            return Err(SimError::CapacityExceeded { what: "flag", capacity: cap });
        }

        self.clear();
        self.flag_anim = SpriteAnimation::new(assets.flag_frames.clone(), self.cfg.flag_frame_secs);
        self.flag_anim.start(now);
        for pos in &level.players {
            self.add_player(*pos, &assets.player_sprite, &assets.player_palette, now)?;
        }
        let frame = self.flag_anim.current().copied().unwrap_or(Sprite::SOLID);
        for (i, pos) in level.flags.iter().enumerate() {
            self.add_flag(*pos, &frame, &assets.flag_palette(i), now)?;
        }
        log::info!("level loaded: {} players, {} flags", self.players.len(), self.flags.len());
        Ok(())
    }

    fn tick(&mut self, map: &TileMap, bus: &mut EventBus, now: Instant) -> TickReport {
        self.tick_counter = self.tick_counter.wrapping_add(1);
        self.apply_input(bus);

        let mut report = TickReport::default();
        let col = self.cfg.collision;
        for (h, p) in self.players.iter_mut() {
            p.update(now);
            let r = Collision::resolve_map(p, map, &col);
            if !matches!(r, Resolution::Stuck { .. }) {
                Collision::settle(p, map, &col);
            }
            report.resolutions.push((h, r));
        }

        report.contacts = self.contacts();

        if self.flag_anim.step(now) {
            if let Some(frame) = self.flag_anim.current().copied() {
                for (_, f) in self.flags.iter_mut() {
                    f.set_sprite(&frame);
                }
            }
        }

        report.won = self.check_win();
        if report.won && !self.won {
            log::info!("all players reached their flags on tick {}", self.tick_counter);
        }
        self.won = report.won;
        report
    }

    fn check_win(&self) -> bool {
        let flags: Vec<&Entity> = self.flags.iter().map(|(_, f)| f).collect();
        let mut players = self.players.iter().map(|(_, p)| p).peekable();
        if players.peek().is_none() {
            return false;
        }
        players
            .enumerate()
            .all(|(i, p)| flags.get(i).is_some_and(|f| Collision::check_entity(p, f).overlaps()))
    }
}

impl World {
    /// Route one input event to every player.
    pub fn handle_event(&mut self, event: Event) {
        for (_, p) in self.players.iter_mut() {
            match event {
                Event::KeyDown(k) => player::on_key_down(p, k),
                Event::KeyUp(k) => player::on_key_up(p, k),
                Event::MouseClick { .. } => {}
            }
        }
    }

    fn apply_input(&mut self, bus: &mut EventBus) {
        if self.input.is_empty() {
            return;
        }
        for event in bus.drain(INPUT_SUBSCRIBER) {
            self.handle_event(event);
        }
    }

    /// Player-player and player-flag overlaps. Advisory only: nobody moves.
    fn contacts(&self) -> Vec<Contact> {
        let players: Vec<(Handle, &Entity)> = self.players.iter().collect();
        let mut out = Vec::new();
        for (i, (ha, a)) in players.iter().enumerate() {
            for (hb, b) in players.iter().skip(i + 1) {
                if let Some(push) = Collision::resolve_entity(a, b) {
                    out.push(Contact { a: *ha, b: *hb, push });
                }
            }
            for (hf, f) in self.flags.iter() {
                if let Some(push) = Collision::resolve_entity(a, f) {
                    out.push(Contact { a: *ha, b: hf, push });
                }
            }
        }
        out
    }

    pub fn players(&self) -> impl Iterator<Item = (Handle, &Entity)> + '_ {
        self.players.iter()
    }

    pub fn flags(&self) -> impl Iterator<Item = (Handle, &Entity)> + '_ {
        self.flags.iter()
    }

    pub fn player(&self, h: Handle) -> Option<&Entity> {
        self.players.get(h)
    }

    pub fn player_mut(&mut self, h: Handle) -> Option<&mut Entity> {
        self.players.get_mut(h)
    }

    pub fn flag(&self, h: Handle) -> Option<&Entity> {
        self.flags.get(h)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Key;
    use crate::geometry::Grid;
    use crate::timer::{Clock, ManualClock};
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(16);

    // Solid floor whose top edge is y = -104
    fn floor_map() -> TileMap {
        let mut m = TileMap::filled(Grid::new(40, 40), vec![Sprite::EMPTY, Sprite::SOLID]);
        m.fill_row(33, 1, 0);
        m
    }

    fn world() -> World {
        World::new(SimConfig { grid: Grid::new(40, 40), ..Default::default() })
    }

    fn run(
        w: &mut World,
        map: &TileMap,
        bus: &mut EventBus,
        clock: &ManualClock,
        ticks: usize,
    ) -> TickReport {
        let mut last = TickReport::default();
        for _ in 0..ticks {
            clock.advance(TICK);
            last = w.tick(map, bus, clock.now());
        }
        last
    }

    #[test]
    fn test_player_comes_to_rest_on_floor() {
        let clock = ManualClock::new(Instant::now());
        let map = floor_map();
        let mut bus = EventBus::new();
        let mut w = world();
        let h = w
            .add_player(Vec2::new(0.0, -100.0), &Sprite::SOLID, &[0; PAL_LENGTH], clock.now())
            .unwrap();

        let first = run(&mut w, &map, &mut bus, &clock, 1);
        assert_eq!(first.resolutions, vec![(h, Resolution::Resolved { steps: 4 })]);

        run(&mut w, &map, &mut bus, &clock, 30);
        let p = w.player(h).unwrap();
        assert_eq!(p.pos, Vec2::new(0.0, -96.0));
        assert_eq!(p.vel, Vec2::ZERO);
        assert_eq!(p.machines()[0].current(), player::jump::IDLE);
        assert_eq!(p.machines()[1].current(), player::motion::IDLE);
    }

    #[test]
    fn test_jump_and_land_through_bus() {
        let clock = ManualClock::new(Instant::now());
        let map = floor_map();
        let mut bus = EventBus::new();
        let mut w = world();
        w.subscribe_input(&mut bus).unwrap();
        w.subscribe_input(&mut bus).unwrap();
        let h = w
            .add_player(Vec2::new(0.0, -96.0), &Sprite::SOLID, &[0; PAL_LENGTH], clock.now())
            .unwrap();
        run(&mut w, &map, &mut bus, &clock, 5);

        bus.publish(Event::KeyDown(Key::Up));
        run(&mut w, &map, &mut bus, &clock, 1);
        let p = w.player(h).unwrap();
        assert!(p.pos.y > -96.0);
        assert!(p.control.airborne);
        assert_eq!(p.machines()[0].current(), player::jump::JUMPING);

        bus.publish(Event::KeyUp(Key::Up));
        run(&mut w, &map, &mut bus, &clock, 1);
        assert_eq!(w.player(h).unwrap().machines()[0].current(), player::jump::FALLING);

        run(&mut w, &map, &mut bus, &clock, 200);
        let p = w.player(h).unwrap();
        assert_eq!(p.pos.y, -96.0);
        assert_eq!(p.vel.y, 0.0);
        assert_eq!(p.machines()[0].current(), player::jump::IDLE);
        assert!(!p.control.airborne);
    }

    #[test]
    fn test_input_reaches_every_player() {
        let now = Instant::now();
        let mut w = world();
        let a = w.add_player(Vec2::ZERO, &Sprite::SOLID, &[0; PAL_LENGTH], now).unwrap();
        let b = w.add_player(Vec2::new(20.0, 0.0), &Sprite::SOLID, &[0; PAL_LENGTH], now).unwrap();
        w.handle_event(Event::KeyDown(Key::Right));
        assert_eq!(w.player(a).unwrap().acc.x, 35.0);
        assert_eq!(w.player(b).unwrap().acc.x, 35.0);
        w.handle_event(Event::MouseClick { x: 1, y: 1 });
        w.handle_event(Event::KeyUp(Key::Right));
        assert_eq!(w.player(a).unwrap().acc.x, 0.0);
    }

    #[test]
    fn test_input_applied_in_publish_order() {
        let clock = ManualClock::new(Instant::now());
        let map = floor_map();
        let mut bus = EventBus::new();
        let mut w = world();
        w.subscribe_input(&mut bus).unwrap();
        let pal = [0; PAL_LENGTH];
        let h = w.add_player(Vec2::new(0.0, -96.0), &Sprite::SOLID, &pal, clock.now()).unwrap();

        bus.publish(Event::KeyDown(Key::Left));
        run(&mut w, &map, &mut bus, &clock, 1);
        assert_eq!(w.player(h).unwrap().acc.x, -35.0);

        // Switching direction within one tick ends up holding Right
        bus.publish(Event::KeyUp(Key::Left));
        bus.publish(Event::KeyDown(Key::Right));
        run(&mut w, &map, &mut bus, &clock, 1);
        assert_eq!(w.player(h).unwrap().acc.x, 35.0);

        // Release then press within one tick still queues a jump
        bus.publish(Event::KeyUp(Key::Up));
        bus.publish(Event::KeyDown(Key::Up));
        run(&mut w, &map, &mut bus, &clock, 1);
        let p = w.player(h).unwrap();
        assert_eq!(p.machines()[0].current(), player::jump::JUMPING);
        assert!(p.control.jump_held);
    }

    #[test]
    fn test_unsubscribed_world_ignores_bus() {
        let clock = ManualClock::new(Instant::now());
        let map = floor_map();
        let mut bus = EventBus::new();
        let mut w = world();
        let h = w
            .add_player(Vec2::new(0.0, -96.0), &Sprite::SOLID, &[0; PAL_LENGTH], clock.now())
            .unwrap();
        bus.publish(Event::KeyDown(Key::Left));
        run(&mut w, &map, &mut bus, &clock, 1);
        assert_eq!(w.player(h).unwrap().acc.x, 0.0);
    }

    #[test]
    fn test_player_capacity() {
        let now = Instant::now();
        let mut w = world();
        for i in 0..4 {
            w.add_player(Vec2::new(i as f32 * 10.0, 0.0), &Sprite::SOLID, &[0; PAL_LENGTH], now)
                .unwrap();
        }
        let err = w.add_player(Vec2::ZERO, &Sprite::SOLID, &[0; PAL_LENGTH], now).unwrap_err();
        assert_eq!(err, SimError::CapacityExceeded { what: "player", capacity: 4 });
        assert_eq!(w.player_count(), 4);
    }

    #[test]
    fn test_remove_player_and_stale_handle() {
        let now = Instant::now();
        let mut w = world();
        let h = w.add_player(Vec2::ZERO, &Sprite::SOLID, &[0; PAL_LENGTH], now).unwrap();
        let e = w.remove_player(h).unwrap();
        assert_eq!(e.kind, EntityKind::Player);
        assert_eq!(w.remove_player(h).unwrap_err(), SimError::StaleHandle);
        assert!(w.player(h).is_none());
    }

    #[test]
    fn test_win_needs_each_player_on_own_flag() {
        let now = Instant::now();
        let mut w = world();
        assert!(!w.check_win());

        let level = LevelData {
            players: vec![Vec2::ZERO, Vec2::new(40.0, 0.0)],
            flags: vec![Vec2::new(3.0, 0.0), Vec2::new(80.0, 0.0)],
        };
        w.load_level(&level, &LevelAssets::default(), now).unwrap();
        assert!(!w.check_win());

        let second = w.players().nth(1).map(|(h, _)| h).unwrap();
        w.player_mut(second).unwrap().pos = Vec2::new(78.0, 2.0);
        assert!(w.check_win());

        // Players swapped onto each other's flags do not count
        let first = w.players().next().map(|(h, _)| h).unwrap();
        w.player_mut(first).unwrap().pos = Vec2::new(80.0, 0.0);
        w.player_mut(second).unwrap().pos = Vec2::new(3.0, 0.0);
        assert!(!w.check_win());
    }

    #[test]
    fn test_win_with_entities_added_directly() {
        let now = Instant::now();
        let pal = [0; PAL_LENGTH];
        let mut w = world();
        w.add_player(Vec2::ZERO, &Sprite::SOLID, &pal, now).unwrap();
        let far = w.add_flag(Vec2::new(20.0, 0.0), &Sprite::SOLID, &pal, now).unwrap();
        assert!(!w.check_win());

        w.remove_flag(far).unwrap();
        w.add_flag(Vec2::new(4.0, -3.0), &Sprite::SOLID, &pal, now).unwrap();
        assert!(w.check_win());
    }

    #[test]
    fn test_win_pairing_survives_reload() {
        let now = Instant::now();
        let mut w = world();
        let level = LevelData {
            players: vec![Vec2::ZERO, Vec2::new(40.0, 0.0)],
            flags: vec![Vec2::new(3.0, 0.0), Vec2::new(80.0, 0.0)],
        };
        w.load_level(&level, &LevelAssets::default(), now).unwrap();
        w.load_level(&level, &LevelAssets::default(), now).unwrap();
        let positions: Vec<Vec2> = w.players().map(|(_, p)| p.pos).collect();
        assert_eq!(positions, level.players);

        let second = w.players().nth(1).map(|(h, _)| h).unwrap();
        w.player_mut(second).unwrap().pos = Vec2::new(80.0, 0.0);
        assert!(w.check_win());
    }

    #[test]
    fn test_win_fails_when_flags_are_missing() {
        let now = Instant::now();
        let mut w = world();
        let level = LevelData {
            players: vec![Vec2::ZERO, Vec2::new(40.0, 0.0)],
            flags: vec![Vec2::ZERO],
        };
        w.load_level(&level, &LevelAssets::default(), now).unwrap();
        assert!(!w.check_win());
    }

    #[test]
    fn test_tick_reports_contacts_and_win() {
        let clock = ManualClock::new(Instant::now());
        let map = floor_map();
        let mut bus = EventBus::new();
        let mut w = world();
        let level = LevelData {
            players: vec![Vec2::new(0.0, -96.0)],
            flags: vec![Vec2::new(2.0, -96.0)],
        };
        w.load_level(&level, &LevelAssets::default(), clock.now()).unwrap();

        let report = run(&mut w, &map, &mut bus, &clock, 1);
        assert!(report.won);
        assert_eq!(report.contacts.len(), 1);
        assert!(report.contacts[0].push.direction.x > 0.0);
        // Contacts never move anyone
        let flag = w.flags().next().map(|(_, f)| f.pos).unwrap();
        assert_eq!(flag, Vec2::new(2.0, -96.0));
    }

    #[test]
    fn test_load_level_replaces_population() {
        let now = Instant::now();
        let mut w = world();
        let old = w.add_player(Vec2::ZERO, &Sprite::SOLID, &[0; PAL_LENGTH], now).unwrap();
        w.load_level(&LevelData::first(), &LevelAssets::default(), now).unwrap();
        assert!(w.player(old).is_none());
        assert_eq!(w.player_count(), 1);
        assert_eq!(w.flag_count(), 1);
        let (_, p) = w.players().next().unwrap();
        assert_eq!(p.machines().len(), 2);
        let (_, f) = w.flags().next().unwrap();
        assert_eq!(f.pos, Vec2::new(10.0, 10.0));
        assert_eq!(f.sprite, Sprite::SOLID);
    }

    #[test]
    fn test_oversized_level_is_rejected_untouched() {
        let now = Instant::now();
        let mut w = world();
        let keep = w.add_player(Vec2::ZERO, &Sprite::SOLID, &[0; PAL_LENGTH], now).unwrap();
        let level = LevelData { players: vec![Vec2::ZERO; 5], flags: Vec::new() };
        assert!(w.load_level(&level, &LevelAssets::default(), now).is_err());
        assert!(w.player(keep).is_some());
    }

    #[test]
    fn test_flags_cycle_animation_frames() {
        let clock = ManualClock::new(Instant::now());
        let map = floor_map();
        let mut bus = EventBus::new();
        let mut w = world();
        let assets = LevelAssets {
            flag_frames: vec![Sprite::SOLID, Sprite::EMPTY],
            ..Default::default()
        };
        let level = LevelData { players: Vec::new(), flags: vec![Vec2::ZERO] };
        w.load_level(&level, &assets, clock.now()).unwrap();
        let sprite = |w: &World| w.flags().next().map(|(_, f)| f.sprite).unwrap();
        assert_eq!(sprite(&w), Sprite::SOLID);

        run(&mut w, &map, &mut bus, &clock, 6);
        assert_eq!(sprite(&w), Sprite::SOLID);
        run(&mut w, &map, &mut bus, &clock, 1);
        assert_eq!(sprite(&w), Sprite::EMPTY);
    }
}
