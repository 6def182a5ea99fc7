use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::{
    CHOP_COOLDOWN_MS, PATCH_RATE, PLAYER_SPEED, ROUND_DURATION_MS, TICK_RATE, TILE_SIZE,
    WORLD_HEIGHT_TILES, WORLD_WIDTH_TILES,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub chop: bool,
}

impl PlayerInput {
    pub fn direction(&self) -> (i32, i32) {
        (
            i32::from(self.right) - i32::from(self.left),
            i32::from(self.down) - i32::from(self.up),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "facingX")]
    pub facing_x: i32,
    #[serde(rename = "facingY")]
    pub facing_y: i32,
    pub score: u32,
}

impl PlayerView {
    pub fn new(id: String, name: String, x: f32, y: f32) -> Self {
        Self {
            id,
            name,
            x,
            y,
            facing_x: 0,
            facing_y: 1,
            score: 0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct JoinOptions {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    #[serde(rename = "serverNowMs")]
    pub server_now_ms: u64,
    #[serde(rename = "roundEndsAt")]
    pub round_ends_at: u64,
    pub players: BTreeMap<String, PlayerView>,
    pub trees: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundEvent {
    pub round: u64,
    pub grown: usize,
    pub round_ends_at: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    #[serde(rename = "worldWidthTiles")]
    pub world_width_tiles: i32,
    #[serde(rename = "worldHeightTiles")]
    pub world_height_tiles: i32,
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "patchRate")]
    pub patch_rate: u32,
    #[serde(rename = "roundDurationMs")]
    pub round_duration_ms: u64,
    #[serde(rename = "playerSpeed")]
    pub player_speed: f32,
    #[serde(rename = "chopCooldownMs")]
    pub chop_cooldown_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            world_width_tiles: WORLD_WIDTH_TILES,
            world_height_tiles: WORLD_HEIGHT_TILES,
            tick_rate: TICK_RATE,
            patch_rate: PATCH_RATE,
            round_duration_ms: ROUND_DURATION_MS,
            player_speed: PLAYER_SPEED,
            chop_cooldown_ms: CHOP_COOLDOWN_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_direction_cancels_opposites() {
        let input = PlayerInput {
            up: true,
            down: true,
            left: false,
            right: true,
            chop: false,
        };
        assert_eq!(input.direction(), (1, 0));
        assert_eq!(PlayerInput::default().direction(), (0, 0));
    }

    #[test]
    fn new_player_faces_down() {
        let player = PlayerView::new("p".to_string(), "P".to_string(), 16.0, 16.0);
        assert_eq!((player.facing_x, player.facing_y), (0, 1));
        assert_eq!(player.score, 0);
    }

    #[test]
    fn snapshot_serializes_camel_case_fields() {
        let mut players = BTreeMap::new();
        players.insert(
            "abc".to_string(),
            PlayerView::new("abc".to_string(), "A".to_string(), 1.0, 2.0),
        );
        let snapshot = Snapshot {
            server_now_ms: 5,
            round_ends_at: 10,
            players,
            trees: vec![0, 1],
        };
        let value = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(value["roundEndsAt"], 10);
        assert_eq!(value["players"]["abc"]["facingY"], 1);
        assert_eq!(value["trees"], serde_json::json!([0, 1]));
    }
}
