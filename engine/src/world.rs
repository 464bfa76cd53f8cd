use serde::{Deserialize, Serialize};

use crate::{prelude::*, Tile};

/// Tile grid of a single zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    /// Where arrivals without a better spot get placed. Always walkable
    /// after generation.
    pub entry: IVec2,
    pub up_stairs: Option<IVec2>,
    pub down_stairs: Option<IVec2>,
    /// Spots the generator wants closed doors on.
    pub doors: Vec<IVec2>,
}

impl World {
    /// Create a world filled with wall.
    pub fn new(width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        World {
            width,
            height,
            tiles: vec![Tile::WALL; (width * height) as usize],
            entry: ivec2(width / 2, height / 2),
            up_stairs: None,
            down_stairs: None,
            doors: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: IVec2) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    fn idx(&self, pos: IVec2) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn tile(&self, pos: IVec2) -> Option<&Tile> {
        self.idx(pos).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, pos: IVec2) -> Option<&mut Tile> {
        self.idx(pos).map(|i| &mut self.tiles[i])
    }

    pub fn is_walkable(&self, pos: IVec2) -> bool {
        self.tile(pos).is_some_and(|t| t.walkable)
    }

    pub fn is_visible(&self, pos: IVec2) -> bool {
        self.tile(pos).is_some_and(|t| t.visible)
    }

    /// Set a tile to walkable with the given glyph.
    pub fn carve(&mut self, pos: IVec2, glyph: char) {
        if let Some(t) = self.tile_mut(pos) {
            t.walkable = true;
            t.glyph = glyph;
        }
    }

    /// Overwrite every tile with the given one.
    pub fn fill(&mut self, tile: Tile) {
        self.tiles.iter_mut().for_each(|t| *t = tile.clone());
    }

    pub fn positions(&self) -> impl Iterator<Item = IVec2> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| ivec2(x, y)))
    }

    pub fn walkable_positions(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.positions().filter(|&p| self.is_walkable(p))
    }

    pub fn clear_visible(&mut self) {
        self.tiles.iter_mut().for_each(|t| t.visible = false);
    }

    /// Wrap an out-of-bounds position into the neighbouring zone's
    /// coordinates. Returns the zone offset and the wrapped position.
    pub fn wrap(&self, pos: IVec2) -> (IVec2, IVec2) {
        let dz = ivec2(
            if pos.x >= self.width {
                1
            } else if pos.x < 0 {
                -1
            } else {
                0
            },
            if pos.y >= self.height {
                1
            } else if pos.y < 0 {
                -1
            } else {
                0
            },
        );
        let wrapped = ivec2(
            match dz.x {
                1 => 0,
                -1 => self.width - 1,
                _ => pos.x,
            },
            match dz.y {
                1 => 0,
                -1 => self.height - 1,
                _ => pos.y,
            },
        );
        (dz, wrapped)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounds_and_carving() {
        let mut w = World::new(10, 5);
        assert!(!w.is_walkable(ivec2(3, 3)));
        w.carve(ivec2(3, 3), '.');
        assert!(w.is_walkable(ivec2(3, 3)));
        assert!(!w.in_bounds(ivec2(10, 0)));
        assert!(w.tile(ivec2(-1, 0)).is_none());
        assert_eq!(w.walkable_positions().count(), 1);
    }

    #[test]
    fn wrapping() {
        let w = World::new(40, 24);
        assert_eq!(w.wrap(ivec2(40, 7)), (ivec2(1, 0), ivec2(0, 7)));
        assert_eq!(w.wrap(ivec2(5, -1)), (ivec2(0, -1), ivec2(5, 23)));
        assert_eq!(w.wrap(ivec2(-1, 24)), (ivec2(-1, 1), ivec2(39, 0)));
        assert_eq!(w.wrap(ivec2(5, 5)), (ivec2(0, 0), ivec2(5, 5)));
    }
}
