use std::collections::{BTreeMap, HashMap};

use crate::constants::{
    INITIAL_TREE_DENSITY, REGROWTH_PROBABILITY, ROUND_DURATION_MS, SPAWN_ATTEMPTS,
};
use crate::rng::Rng;
use crate::server_utils::sanitize_name;
use crate::types::{GameConfig, JoinOptions, PlayerInput, PlayerView, RoundEvent, Snapshot};
use crate::world::WorldGrid;

mod chop;
mod movement;
mod regrowth;
mod spawn_system;
mod utils;

pub use self::chop::{chop_candidates, try_chop};
pub use self::movement::{clamp_to_world, integrate_movement};
pub use self::regrowth::regrow;

use self::utils::now_ms;

pub trait Room {
    fn on_create(seed: u32) -> Self
    where
        Self: Sized;

    fn on_join(&mut self, session_id: &str, options: JoinOptions) -> PlayerView;

    fn on_leave(&mut self, session_id: &str) -> bool;

    fn on_input(&mut self, session_id: &str, input: PlayerInput);

    fn on_tick(&mut self, dt_ms: u64) -> Option<RoundEvent>;

    fn snapshot(&self) -> Snapshot;
}

#[derive(Clone, Debug)]
pub struct GameRoom {
    pub started_at_ms: u64,
    pub config: GameConfig,

    rng: Rng,
    world: WorldGrid,
    players: BTreeMap<String, PlayerView>,
    inputs: HashMap<String, PlayerInput>,
    last_chop_at: HashMap<String, u64>,

    round_ends_at: u64,
    elapsed_ms: u64,
    tick_counter: u64,
    round_counter: u64,
}

impl GameRoom {
    pub fn new(seed: u32) -> Self {
        Self::with_start_time(seed, now_ms())
    }

    pub fn with_start_time(seed: u32, started_at_ms: u64) -> Self {
        let mut rng = Rng::new(seed);
        let world = WorldGrid::standard(INITIAL_TREE_DENSITY, &mut rng);
        Self {
            started_at_ms,
            config: GameConfig::default(),
            rng,
            world,
            players: BTreeMap::new(),
            inputs: HashMap::new(),
            last_chop_at: HashMap::new(),
            round_ends_at: started_at_ms + ROUND_DURATION_MS,
            elapsed_ms: 0,
            tick_counter: 0,
            round_counter: 0,
        }
    }

    pub fn current_now_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.elapsed_ms)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn round_count(&self) -> u64 {
        self.round_counter
    }

    pub fn round_ends_at(&self) -> u64 {
        self.round_ends_at
    }

    pub fn world(&self) -> &WorldGrid {
        &self.world
    }

    pub fn player(&self, session_id: &str) -> Option<&PlayerView> {
        self.players.get(session_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn has_player(&self, session_id: &str) -> bool {
        self.players.contains_key(session_id)
    }

    pub fn join(&mut self, session_id: &str, options: JoinOptions) -> PlayerView {
        if let Some(existing) = self.players.get(session_id) {
            return existing.clone();
        }
        let name = sanitize_name(options.name.as_deref().unwrap_or_default());
        let (x, y) = self.pick_spawn_position();
        let player = PlayerView::new(session_id.to_string(), name, x, y);
        self.players.insert(session_id.to_string(), player.clone());
        player
    }

    pub fn leave(&mut self, session_id: &str) -> bool {
        self.inputs.remove(session_id);
        self.last_chop_at.remove(session_id);
        self.players.remove(session_id).is_some()
    }

    pub fn receive_input(&mut self, session_id: &str, input: PlayerInput) {
        if !self.players.contains_key(session_id) {
            return;
        }
        self.inputs.insert(session_id.to_string(), input);
    }

    pub fn step(&mut self, dt_ms: u64) -> Option<RoundEvent> {
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.current_now_ms();

        self.update_players(dt_ms, now_ms);
        self.update_round(now_ms)
    }

    pub fn build_snapshot(&self) -> Snapshot {
        Snapshot {
            server_now_ms: self.current_now_ms(),
            round_ends_at: self.round_ends_at,
            players: self.players.clone(),
            trees: self.world.trees().to_vec(),
        }
    }

    fn update_players(&mut self, dt_ms: u64, now_ms: u64) {
        let dt_sec = dt_ms as f32 / 1000.0;

        for (id, player) in self.players.iter_mut() {
            let input = self.inputs.get(id).copied().unwrap_or_default();
            integrate_movement(player, input, dt_sec, &self.world);

            let last_chop_at = self.last_chop_at.get(id).copied();
            if try_chop(player, &mut self.world, input.chop, last_chop_at, now_ms).is_some() {
                self.last_chop_at.insert(id.clone(), now_ms);
            }
        }
    }

    fn update_round(&mut self, now_ms: u64) -> Option<RoundEvent> {
        if now_ms < self.round_ends_at {
            return None;
        }
        let grown = regrow(&mut self.world, REGROWTH_PROBABILITY, &mut self.rng);
        self.round_ends_at = now_ms + ROUND_DURATION_MS;
        self.round_counter += 1;
        Some(RoundEvent {
            round: self.round_counter,
            grown,
            round_ends_at: self.round_ends_at,
        })
    }
}

impl Room for GameRoom {
    fn on_create(seed: u32) -> Self {
        Self::new(seed)
    }

    fn on_join(&mut self, session_id: &str, options: JoinOptions) -> PlayerView {
        self.join(session_id, options)
    }

    fn on_leave(&mut self, session_id: &str) -> bool {
        self.leave(session_id)
    }

    fn on_input(&mut self, session_id: &str, input: PlayerInput) {
        self.receive_input(session_id, input);
    }

    fn on_tick(&mut self, dt_ms: u64) -> Option<RoundEvent> {
        self.step(dt_ms)
    }

    fn snapshot(&self) -> Snapshot {
        self.build_snapshot()
    }
}
