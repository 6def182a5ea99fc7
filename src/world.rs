use crate::constants::{TILE_SIZE, WORLD_HEIGHT_TILES, WORLD_WIDTH_TILES};
use crate::rng::Rng;

pub const EMPTY: u8 = 0;
pub const TREE: u8 = 1;

// Row-major: y * width + x.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldGrid {
    width: i32,
    height: i32,
    trees: Vec<u8>,
}

impl WorldGrid {
    pub fn empty(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            trees: vec![EMPTY; (width * height) as usize],
        }
    }

    pub fn seeded(width: i32, height: i32, density: f32, rng: &mut Rng) -> Self {
        let mut grid = Self::empty(width, height);
        for tile in grid.trees.iter_mut() {
            *tile = if rng.chance(density) { TREE } else { EMPTY };
        }
        grid
    }

    pub fn standard(density: f32, rng: &mut Rng) -> Self {
        Self::seeded(WORLD_WIDTH_TILES, WORLD_HEIGHT_TILES, density, rng)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.in_bounds(x, y), "tile ({x}, {y}) out of bounds");
        (y * self.width + x) as usize
    }

    pub fn has_tree(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.trees[self.index(x, y)] == TREE
    }

    pub fn set_tree(&mut self, x: i32, y: i32, present: bool) {
        debug_assert!(self.in_bounds(x, y), "set_tree outside grid at ({x}, {y})");
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        self.trees[idx] = if present { TREE } else { EMPTY };
    }

    pub fn tree_count(&self) -> usize {
        self.trees.iter().filter(|&&tile| tile == TREE).count()
    }

    pub fn trees(&self) -> &[u8] {
        &self.trees
    }

    pub fn tile_of(px: f32, py: f32) -> (i32, i32) {
        (
            (px / TILE_SIZE).floor() as i32,
            (py / TILE_SIZE).floor() as i32,
        )
    }

    pub fn tile_center(x: i32, y: i32) -> (f32, f32) {
        (
            x as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            y as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        )
    }
}
