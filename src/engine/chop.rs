use crate::constants::CHOP_COOLDOWN_MS;
use crate::types::PlayerView;
use crate::world::WorldGrid;

// Own tile, +x, -x, +y, -y; a cardinal facing moves the faced tile to second.
pub fn chop_candidates(px: i32, py: i32, facing_x: i32, facing_y: i32) -> [(i32, i32); 5] {
    let mut candidates = [
        (px, py),
        (px + 1, py),
        (px - 1, py),
        (px, py + 1),
        (px, py - 1),
    ];
    if (facing_x == 0) != (facing_y == 0) {
        let faced = (px + facing_x, py + facing_y);
        if let Some(pos) = candidates[1..].iter().position(|&tile| tile == faced) {
            candidates[1..=pos + 1].rotate_right(1);
        }
    }
    candidates
}

// Caller records the chop time only on Some.
pub fn try_chop(
    player: &mut PlayerView,
    world: &mut WorldGrid,
    chop: bool,
    last_chop_at: Option<u64>,
    now_ms: u64,
) -> Option<(i32, i32)> {
    if !chop {
        return None;
    }
    if let Some(last) = last_chop_at {
        if now_ms.saturating_sub(last) < CHOP_COOLDOWN_MS {
            return None;
        }
    }

    let (px, py) = WorldGrid::tile_of(player.x, player.y);
    let target = chop_candidates(px, py, player.facing_x, player.facing_y)
        .into_iter()
        .find(|&(tx, ty)| world.has_tree(tx, ty))?;

    world.set_tree(target.0, target.1, false);
    player.score += 1;
    Some(target)
}
