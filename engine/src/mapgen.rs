//! Zone map generators.
//!
//! Every layout leaves the world's `entry` walkable.

use glam::{dvec2, DVec2};
use rand::prelude::*;
use util::{srng, RngExt};

use crate::{prelude::*, Rgb, Tile, World};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Layout {
    /// Rooms and tunnels, for everything below the surface.
    Rooms,
    /// Escape-time fractal terrain of the surface.
    Overworld,
    /// Walled building with the editor console.
    Lab,
}

/// Julia set parameters shared by the overworld and the world map.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FractalField {
    pub c: DVec2,
    pub max_iter: u32,
    /// Extent of the whole overworld in tiles.
    pub span: IVec2,
}

impl FractalField {
    pub fn new(seed: u64, span: IVec2) -> Self {
        let mut rng = srng(&seed);
        // Stay near the boundary of the Mandelbrot set for interesting
        // connected shapes.
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let c = DVec2::from_angle(angle) * 0.7885;
        FractalField {
            c,
            max_iter: 48,
            span,
        }
    }

    /// Map a global overworld tile position into the complex plane.
    pub fn to_plane(&self, global: DVec2) -> DVec2 {
        let span = self.span.as_dvec2().max(DVec2::ONE);
        (global / span - dvec2(0.5, 0.5)) * dvec2(3.2, 3.2 * span.y / span.x)
    }

    /// Iterations until `z -> z^2 + c` leaves the radius 2 disc.
    pub fn escape(&self, p: DVec2) -> u32 {
        let mut z = p;
        for i in 0..self.max_iter {
            if z.length_squared() > 4.0 {
                return i;
            }
            z = dvec2(z.x * z.x - z.y * z.y, 2.0 * z.x * z.y) + self.c;
        }
        self.max_iter
    }
}

/// Generate a zone map into `world`.
///
/// `up_pos` is where the arriving stairway should surface, when there is
/// one.
pub fn generate(
    layout: Layout,
    world: &mut World,
    rng: &mut impl Rng,
    coord: IVec3,
    up_pos: Option<IVec2>,
    field: &FractalField,
) {
    log::debug!("generating {layout:?} at {coord}");
    match layout {
        Layout::Rooms => rooms(world, rng, up_pos),
        Layout::Overworld => overworld(world, rng, coord, field),
        Layout::Lab => lab(world),
    }
    let entry = world.entry;
    if !world.is_walkable(entry) {
        world.carve(entry, '.');
    }
}

#[derive(Copy, Clone, Debug)]
struct Room {
    min: IVec2,
    max: IVec2,
}

impl Room {
    fn center(&self) -> IVec2 {
        (self.min + self.max) / 2
    }

    fn intersects(&self, other: &Room) -> bool {
        // One tile of wall between rooms.
        self.min.x <= other.max.x + 1
            && self.max.x + 1 >= other.min.x
            && self.min.y <= other.max.y + 1
            && self.max.y + 1 >= other.min.y
    }

    fn contains(&self, p: IVec2) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
    }
}

fn tunnel(world: &mut World, rng: &mut impl Rng, a: IVec2, b: IVec2) {
    let corner = if rng.gen() { ivec2(b.x, a.y) } else { ivec2(a.x, b.y) };
    for (p, q) in [(a, corner), (corner, b)] {
        for t in util::line_tiles(p, q) {
            if !world.is_walkable(t) {
                world.carve(t, '.');
            }
        }
    }
}

fn rooms(world: &mut World, rng: &mut impl Rng, up_pos: Option<IVec2>) {
    let (w, h) = (world.width(), world.height());
    let mut rooms: Vec<Room> = Vec::new();

    for _ in 0..60 {
        if rooms.len() >= 8 {
            break;
        }
        let size = ivec2(rng.gen_range(3..=8), rng.gen_range(3..=6));
        if size.x + 2 >= w || size.y + 2 >= h {
            continue;
        }
        let min = ivec2(
            rng.gen_range(1..w - size.x - 1),
            rng.gen_range(1..h - size.y - 1),
        );
        let room = Room {
            min,
            max: min + size - IVec2::ONE,
        };
        if rooms.iter().any(|r| r.intersects(&room)) {
            continue;
        }
        for y in room.min.y..=room.max.y {
            for x in room.min.x..=room.max.x {
                world.carve(ivec2(x, y), '.');
            }
        }
        rooms.push(room);
    }

    let Some(first) = rooms.first().copied() else {
        // Degenerate map, a single open cell.
        world.entry = ivec2(w / 2, h / 2);
        world.carve(world.entry, '<');
        world.up_stairs = Some(world.entry);
        return;
    };

    for pair in rooms.windows(2) {
        tunnel(world, rng, pair[0].center(), pair[1].center());
    }

    let up = match up_pos.filter(|&p| world.in_bounds(p)) {
        Some(p) => {
            if !rooms.iter().any(|r| r.contains(p)) {
                tunnel(world, rng, p, first.center());
            }
            p
        }
        None => first.center(),
    };
    world.carve(up, '<');
    world.up_stairs = Some(up);
    world.entry = up;

    let down = rooms
        .iter()
        .rev()
        .map(|r| r.center())
        .find(|&c| c != up)
        .or_else(|| {
            DIR_8.iter().map(|&d| up + d).find(|&p| world.in_bounds(p))
        });
    if let Some(down) = down {
        world.carve(down, '>');
        world.down_stairs = Some(down);
    }

    // Doors go on corridor chokepoints right outside rooms.
    let mut candidates: Vec<IVec2> = world
        .walkable_positions()
        .filter(|&p| {
            let open = |d: IVec2| world.is_walkable(p + d);
            let choke = (open(ivec2(1, 0)) && open(ivec2(-1, 0))
                && !open(ivec2(0, 1)) && !open(ivec2(0, -1)))
                || (open(ivec2(0, 1)) && open(ivec2(0, -1))
                    && !open(ivec2(1, 0)) && !open(ivec2(-1, 0)));
            choke
                && !rooms.iter().any(|r| r.contains(p))
                && DIR_4.iter().any(|&d| rooms.iter().any(|r| r.contains(p + d)))
                && Some(p) != world.up_stairs
                && Some(p) != world.down_stairs
        })
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(2);
    world.doors = candidates;
}

fn overworld(
    world: &mut World,
    rng: &mut impl Rng,
    coord: IVec3,
    field: &FractalField,
) {
    let size = ivec2(world.width(), world.height());
    let origin = coord.truncate() * size;

    for p in world.positions().collect::<Vec<_>>() {
        let z = field.to_plane((origin + p).as_dvec2());
        let n = field.escape(z);
        let Some(t) = world.tile_mut(p) else { continue };
        if n >= field.max_iter {
            // Inside the set is impassable rock.
            *t = Tile {
                tint: Some(Rgb(90, 70, 110)),
                ..Tile::WALL
            };
        } else {
            let glyph = match n % 4 {
                0 => '.',
                1 => ',',
                2 => '\'',
                _ => '"',
            };
            let k = (n as f64 / field.max_iter as f64).sqrt();
            *t = Tile {
                glyph,
                tint: Some(Rgb(40, 120, 60).lerp(Rgb(220, 200, 120), k)),
                ..Tile::FLOOR
            };
        }
    }

    world.entry = size / 2;
    world.carve(world.entry, '.');

    let floor: Vec<IVec2> = world
        .walkable_positions()
        .filter(|&p| p != world.entry)
        .collect();
    if let Some(&down) = floor.choose(rng) {
        world.carve(down, '>');
        world.down_stairs = Some(down);
    }
}

fn lab(world: &mut World) {
    world.fill(Tile::FLOOR);
    let (w, h) = (world.width(), world.height());
    let min = ivec2(w / 2 - 6, h / 2 - 4);
    let max = ivec2(w / 2 + 6, h / 2 + 4);

    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let p = ivec2(x, y);
            if x == min.x || x == max.x || y == min.y || y == max.y {
                if let Some(t) = world.tile_mut(p) {
                    *t = Tile {
                        tint: Some(Rgb(140, 140, 160)),
                        ..Tile::WALL
                    };
                }
            } else {
                world.carve(p, '.');
            }
        }
    }

    let console = ivec2(w / 2, h / 2);
    world.carve(console, '=');
    let door = ivec2(w / 2, max.y);
    world.carve(door, '.');
    world.doors = vec![door];
    world.entry = door + ivec2(0, 2);
}

#[cfg(test)]
mod test {
    use super::*;

    fn field() -> FractalField {
        FractalField::new(1, ivec2(40 * 16, 24 * 16))
    }

    #[test]
    fn layouts_keep_entry_walkable() {
        for seed in 0..8u64 {
            for layout in [Layout::Rooms, Layout::Overworld, Layout::Lab] {
                let mut world = World::new(40, 24);
                let mut rng = srng(&seed);
                generate(layout, &mut world, &mut rng, ivec3(3, 4, 0), None, &field());
                assert!(world.is_walkable(world.entry), "{layout:?} {seed}");
            }
        }
    }

    #[test]
    fn stairs_surface_where_asked() {
        let mut world = World::new(40, 24);
        let mut rng = srng("stairs");
        generate(
            Layout::Rooms,
            &mut world,
            &mut rng,
            ivec3(0, 0, 1),
            Some(ivec2(7, 9)),
            &field(),
        );
        assert_eq!(world.up_stairs, Some(ivec2(7, 9)));
        assert_eq!(world.entry, ivec2(7, 9));
        assert!(world.down_stairs.is_some());
        assert!(world.doors.len() <= 2);
    }

    #[test]
    fn lab_has_console() {
        let mut world = World::new(40, 24);
        lab(&mut world);
        assert!(world.tile(ivec2(20, 12)).unwrap().is_console());
        assert_eq!(world.doors.len(), 1);
    }

    #[test]
    fn escape_time() {
        let f = FractalField {
            c: DVec2::ZERO,
            max_iter: 20,
            span: IVec2::ONE,
        };
        assert_eq!(f.escape(DVec2::ZERO), 20);
        assert_eq!(f.escape(dvec2(3.0, 0.0)), 0);
    }
}
