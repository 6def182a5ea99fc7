use crate::rng::Rng;
use crate::world::WorldGrid;

const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

// Neighbour checks read the pre-pass grid; new trees never seed this pass.
pub fn regrow(world: &mut WorldGrid, probability: f32, rng: &mut Rng) -> usize {
    let before = world.clone();
    let mut grown = 0;
    for y in 0..before.height() {
        for x in 0..before.width() {
            if before.has_tree(x, y) {
                continue;
            }
            let seeded = NEIGHBOR_OFFSETS
                .iter()
                .any(|(dx, dy)| before.has_tree(x + dx, y + dy));
            if seeded && rng.chance(probability) {
                world.set_tree(x, y, true);
                grown += 1;
            }
        }
    }
    grown
}
