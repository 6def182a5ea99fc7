use rand::distr::Alphanumeric;
use rand::Rng;

use crate::constants::{DEFAULT_PLAYER_NAME, MAX_NAME_LEN, ROOM_NAME};

const SESSION_ID_LEN: usize = 9;

pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

pub fn is_supported_room(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => value.trim().eq_ignore_ascii_case(ROOM_NAME),
    }
}

pub fn make_session_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}
