//! Logic for revealing the zone around the player.

use util::bresenham_line;

use crate::{prelude::*, EntityId, Level};

impl Level {
    /// Whether an unobstructed line runs from `origin` to `target`.
    ///
    /// The endpoints themselves never block, a wall at the target is
    /// still seen.
    pub fn has_line_of_sight(&self, origin: IVec2, target: IVec2) -> bool {
        bresenham_line(origin, target)
            .skip(1)
            .all(|p| !self.blocks_sight(p))
    }

    /// Recompute the visible tiles from `origin` out to a euclidean
    /// `radius`.
    ///
    /// Returns the living actors other than `viewer` that came into view
    /// for the first time.
    pub fn update_fov(
        &mut self,
        origin: IVec2,
        radius: i32,
        viewer: EntityId,
    ) -> Vec<EntityId> {
        let r2 = radius * radius;
        let mut seen = Vec::new();
        for y in -radius..=radius {
            for x in -radius..=radius {
                let p = origin + ivec2(x, y);
                if x * x + y * y <= r2
                    && self.world.in_bounds(p)
                    && self.has_line_of_sight(origin, p)
                {
                    seen.push(p);
                }
            }
        }

        self.world.clear_visible();
        for &p in &seen {
            if let Some(t) = self.world.tile_mut(p) {
                t.visible = true;
                t.explored = true;
            }
        }
        self.need_fov = false;

        let fresh: Vec<EntityId> = self
            .actors()
            .filter(|e| {
                e.id != viewer
                    && e.is_alive()
                    && self.world.is_visible(e.pos)
                    && !self.spotted.contains(&e.id)
            })
            .map(|e| e.id)
            .collect();
        self.spotted.extend(fresh.iter().copied());
        fresh
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Tile, World};

    #[test]
    fn walls_cast_shadows() {
        let mut world = World::new(20, 20);
        world.fill(Tile::FLOOR);
        *world.tile_mut(ivec2(12, 10)).unwrap() = Tile::WALL;
        let mut lev = Level::new(IVec3::ZERO, world);

        lev.update_fov(ivec2(10, 10), 8, EntityId(0));
        assert!(lev.world.is_visible(ivec2(10, 10)));
        assert!(lev.world.is_visible(ivec2(12, 10)));
        assert!(!lev.world.is_visible(ivec2(14, 10)));
        assert!(lev.world.is_visible(ivec2(10, 18)));
        // Outside the circle.
        assert!(!lev.world.is_visible(ivec2(16, 16)));
        assert!(!lev.need_fov);
    }
}
