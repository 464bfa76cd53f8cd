//! Strange attractor particles orbiting the player.
//!
//! The swarm advances in game ticks, not frames, and the same projection
//! serves drawing and contact damage so what you see is what gets hit.

use glam::{dvec2, DVec2, DVec3};
use rand::Rng;
use util::RngExt;

use crate::{prelude::*, Config};

#[derive(Clone, Debug, Default)]
pub struct LorenzAura {
    pub points: Vec<DVec3>,
    /// How many points the swarm reseeds with.
    pub count: usize,
    /// World position the swarm is drawn around.
    pub center: Option<DVec2>,
    /// Set when the swarm was reseeded, renderers drop their trails.
    pub reset_trails: bool,
    prev_pos: Option<IVec2>,
    prev_zone: Option<IVec3>,
}

fn step(p: DVec3, cfg: &Config, rng: &mut impl Rng) -> DVec3 {
    let d = DVec3::new(
        cfg.lorenz_sigma * (p.y - p.x),
        p.x * (cfg.lorenz_rho - p.z) - p.y,
        p.x * p.y - cfg.lorenz_beta * p.z,
    );
    let mut jitter = || (rng.unit() - 0.5) * 2.0 * cfg.lorenz_noise;
    p + d * cfg.lorenz_dt + DVec3::new(jitter(), jitter(), jitter())
}

impl LorenzAura {
    pub fn new(count: usize) -> Self {
        LorenzAura {
            count,
            ..Default::default()
        }
    }

    /// Drop the swarm and recenter on `pos` in `zone`.
    pub fn reset(&mut self, pos: IVec2, zone: IVec3) {
        self.points.clear();
        self.prev_pos = Some(pos);
        self.prev_zone = Some(zone);
        self.center = Some(pos.as_dvec2());
        self.reset_trails = true;
    }

    /// Seed the swarm already burned in onto the attractor wings.
    pub fn seed(&mut self, cfg: &Config, rng: &mut impl Rng) {
        if !self.points.is_empty() {
            return;
        }
        for i in 0..self.count {
            let mut p = DVec3::new(
                (rng.unit() - 0.5) * 6.0,
                (rng.unit() - 0.5) * 6.0,
                25.0 + (rng.unit() - 0.5) * 6.0,
            );
            let burn = 350 + (rng.unit() * 200.0) as usize + i * 50;
            for _ in 0..burn {
                p = step(p, cfg, rng);
            }
            self.points.push(p);
        }
    }

    /// Advance the swarm by `delta` ticks with the player at `pos`.
    pub fn advance(
        &mut self,
        pos: IVec2,
        zone: IVec3,
        delta: i64,
        cfg: &Config,
        rng: &mut impl Rng,
    ) {
        let prev = *self.prev_pos.get_or_insert(pos);
        if self.prev_zone != Some(zone) {
            self.points.clear();
        }
        if (pos - prev).cheb_len() > 2 {
            self.points.clear();
            self.reset_trails = true;
        }
        self.prev_pos = Some(pos);
        self.prev_zone = Some(zone);

        self.seed(cfg, rng);

        let steps = cfg.lorenz_steps_per_tick * delta.max(0);
        for p in self.points.iter_mut() {
            for _ in 0..steps {
                *p = step(*p, cfg, rng);
            }
        }
        self.center = Some(pos.as_dvec2());
    }

    /// Tile offsets of the points from the swarm center.
    ///
    /// The (x, z) phase plane is turned by the configured angle and
    /// centered between the wings, points beyond the radius are dropped.
    pub fn offsets(&self, cfg: &Config) -> Vec<DVec2> {
        if self.points.is_empty() {
            return Vec::new();
        }
        let rot = DVec2::from_angle(cfg.lorenz_angle_deg.to_radians());
        let (z_min, z_max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.z), hi.max(p.z))
            });
        let z_max = if z_max <= z_min { z_min + 1e-6 } else { z_max };
        let natural = rot.rotate(dvec2(0.0, 0.5 * (z_min + z_max)));
        let r2 = cfg.lorenz_radius * cfg.lorenz_radius;

        self.points
            .iter()
            .map(|p| (rot.rotate(dvec2(p.x, p.z)) - natural) * cfg.lorenz_scale)
            .filter(|d| d.length_squared() <= r2)
            .collect()
    }

    /// How many points land on each world tile.
    pub fn tile_hits(&self, cfg: &Config) -> HashMap<IVec2, i64> {
        let mut ret = HashMap::default();
        let Some(center) = self.center else {
            return ret;
        };
        for d in self.offsets(cfg) {
            *ret.entry(crate::tile_of(center + d)).or_insert(0) += 1;
        }
        ret
    }
}

#[cfg(test)]
mod test {
    use util::srng;

    use super::*;

    #[test]
    fn burn_in_reaches_the_wings() {
        let cfg = Config::default();
        let mut rng = srng("lorenz");
        let mut aura = LorenzAura::new(2);
        aura.seed(&cfg, &mut rng);
        assert_eq!(aura.points.len(), 2);
        for p in &aura.points {
            // Nowhere near the unstable origin.
            assert!(p.length() > 1.0);
            assert!(p.z > 0.0 && p.z < 60.0);
        }
    }

    #[test]
    fn teleport_reseeds() {
        let cfg = Config::default();
        let mut rng = srng("teleport");
        let zone = IVec3::ZERO;
        let mut aura = LorenzAura::new(1);
        aura.advance(ivec2(5, 5), zone, 10, &cfg, &mut rng);
        assert!(!aura.reset_trails);
        let before = aura.points.clone();

        aura.advance(ivec2(6, 5), zone, 10, &cfg, &mut rng);
        assert!(!aura.reset_trails);
        assert_ne!(aura.points, before);

        aura.advance(ivec2(20, 5), zone, 10, &cfg, &mut rng);
        assert!(aura.reset_trails);
        assert_eq!(aura.center, Some(dvec2(20.0, 5.0)));
    }

    #[test]
    fn projection_centers_between_wings() {
        let cfg = Config::default();
        let mut aura = LorenzAura::new(0);
        aura.points = vec![DVec3::new(0.0, 0.0, 20.0), DVec3::new(0.0, 0.0, 30.0)];
        aura.center = Some(dvec2(10.0, 10.0));
        let offs = aura.offsets(&cfg);
        assert_eq!(offs.len(), 2);
        // Symmetric around the z midpoint.
        assert!((offs[0] + offs[1]).length() < 1e-9);
        assert!((offs[0].length() - 5.0 * cfg.lorenz_scale).abs() < 1e-9);

        // Far out points fall outside the radius.
        aura.points.push(DVec3::new(500.0, 0.0, 25.0));
        assert_eq!(aura.offsets(&cfg).len(), 2);
        let hits = aura.tile_hits(&cfg);
        assert_eq!(hits.values().sum::<i64>(), 2);
    }
}
