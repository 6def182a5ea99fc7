use crate::constants::{PLAYER_RADIUS, PLAYER_SPEED};
use crate::types::{PlayerInput, PlayerView};
use crate::world::WorldGrid;

pub fn integrate_movement(
    player: &mut PlayerView,
    input: PlayerInput,
    dt_sec: f32,
    world: &WorldGrid,
) {
    let (vx, vy) = input.direction();
    if vx != 0 || vy != 0 {
        let len = ((vx * vx + vy * vy) as f32).sqrt();
        let len = if len > 0.0 { len } else { 1.0 };
        let distance = PLAYER_SPEED * dt_sec;
        player.x += vx as f32 / len * distance;
        player.y += vy as f32 / len * distance;
        player.facing_x = vx.signum();
        player.facing_y = vy.signum();
    }
    clamp_to_world(player, world);
}

pub fn clamp_to_world(player: &mut PlayerView, world: &WorldGrid) {
    player.x = player
        .x
        .clamp(PLAYER_RADIUS, world.width_px() - PLAYER_RADIUS);
    player.y = player
        .y
        .clamp(PLAYER_RADIUS, world.height_px() - PLAYER_RADIUS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_MS;

    const DT: f32 = TICK_MS as f32 / 1000.0;

    fn player_at(x: f32, y: f32) -> PlayerView {
        PlayerView::new("p1".to_string(), "P".to_string(), x, y)
    }

    fn input(up: bool, down: bool, left: bool, right: bool) -> PlayerInput {
        PlayerInput {
            up,
            down,
            left,
            right,
            chop: false,
        }
    }

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn idle_input_keeps_position_and_facing() {
        let world = WorldGrid::empty(40, 30);
        let mut player = player_at(100.0, 100.0);
        player.facing_x = -1;
        player.facing_y = 0;
        integrate_movement(&mut player, PlayerInput::default(), DT, &world);
        assert_eq!((player.x, player.y), (100.0, 100.0));
        assert_eq!((player.facing_x, player.facing_y), (-1, 0));
    }

    #[test]
    fn cardinal_move_advances_speed_times_dt() {
        let world = WorldGrid::empty(40, 30);
        let mut player = player_at(100.0, 100.0);
        integrate_movement(&mut player, input(false, false, false, true), DT, &world);
        assert!(approx_eq(player.x, 106.0));
        assert!(approx_eq(player.y, 100.0));
        assert_eq!((player.facing_x, player.facing_y), (1, 0));
    }

    #[test]
    fn diagonal_move_is_normalized() {
        let world = WorldGrid::empty(40, 30);
        let mut player = player_at(100.0, 100.0);
        integrate_movement(&mut player, input(true, false, true, false), DT, &world);
        let dx = player.x - 100.0;
        let dy = player.y - 100.0;
        assert!(approx_eq((dx * dx + dy * dy).sqrt(), 6.0));
        assert!(dx < 0.0 && dy < 0.0);
        assert_eq!((player.facing_x, player.facing_y), (-1, -1));
    }

    #[test]
    fn opposing_keys_cancel_out() {
        let world = WorldGrid::empty(40, 30);
        let mut player = player_at(100.0, 100.0);
        integrate_movement(&mut player, input(true, true, true, true), DT, &world);
        assert_eq!((player.x, player.y), (100.0, 100.0));
        assert_eq!((player.facing_x, player.facing_y), (0, 1));
    }

    #[test]
    fn position_is_clamped_inside_world_on_every_edge() {
        let world = WorldGrid::empty(40, 30);
        let directions = [
            input(true, false, true, false),
            input(false, true, false, true),
            input(true, false, false, true),
            input(false, true, true, false),
        ];
        for direction in directions {
            let mut player = player_at(640.0, 480.0);
            for _ in 0..400 {
                integrate_movement(&mut player, direction, DT, &world);
                assert!(player.x >= PLAYER_RADIUS && player.x <= world.width_px() - PLAYER_RADIUS);
                assert!(player.y >= PLAYER_RADIUS && player.y <= world.height_px() - PLAYER_RADIUS);
            }
        }
    }

    #[test]
    fn clamp_pulls_outside_positions_back() {
        let world = WorldGrid::empty(40, 30);
        let mut player = player_at(-50.0, 5_000.0);
        clamp_to_world(&mut player, &world);
        assert_eq!(player.x, PLAYER_RADIUS);
        assert_eq!(player.y, world.height_px() - PLAYER_RADIUS);
    }
}
