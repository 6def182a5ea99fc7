use super::*;

impl GameRoom {
    pub(super) fn pick_spawn_position(&mut self) -> (f32, f32) {
        for _ in 0..SPAWN_ATTEMPTS {
            let tx = self.rng.below(self.world.width());
            let ty = self.rng.below(self.world.height());
            if !self.world.has_tree(tx, ty) {
                return WorldGrid::tile_center(tx, ty);
            }
        }
        WorldGrid::tile_center(0, 0)
    }
}
