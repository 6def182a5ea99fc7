pub const TILE_SIZE: f32 = 32.0;
pub const WORLD_WIDTH_TILES: i32 = 40;
pub const WORLD_HEIGHT_TILES: i32 = 30;
pub const WORLD_WIDTH_PX: f32 = WORLD_WIDTH_TILES as f32 * TILE_SIZE;
pub const WORLD_HEIGHT_PX: f32 = WORLD_HEIGHT_TILES as f32 * TILE_SIZE;

pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const PATCH_RATE: u32 = 15;
pub const PATCH_MS: u64 = 1000 / PATCH_RATE as u64;

pub const ROUND_DURATION_MS: u64 = 60_000;

pub const PLAYER_SPEED: f32 = 120.0;
pub const PLAYER_RADIUS: f32 = TILE_SIZE * 0.35;
pub const CHOP_COOLDOWN_MS: u64 = 300;

pub const INITIAL_TREE_DENSITY: f32 = 0.15;
pub const REGROWTH_PROBABILITY: f32 = 0.5;

pub const SPAWN_ATTEMPTS: usize = 100;
pub const MAX_NAME_LEN: usize = 16;
pub const DEFAULT_PLAYER_NAME: &str = "Player";

pub const ROOM_NAME: &str = "game";
