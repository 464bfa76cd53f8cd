//! Turning the held rune into damage.

use std::f64::consts::FRAC_1_SQRT_2;

use glam::DVec2;
use rand::Rng;
use util::RngExt;

use crate::{prelude::*, tile_of, Faction, Game};

/// Half the diagonal of a unit tile.
pub const HALF_DIAGONAL: f64 = FRAC_1_SQRT_2;

/// Roll whether channelling `over` vertices past `limit` fails.
///
/// Failure chance is `over / (limit + over)`, zero when not over.
pub fn fizzle_roll(rng: &mut impl Rng, over: usize, limit: usize) -> bool {
    if over == 0 {
        return false;
    }
    rng.chance(over as f64 / (limit + over) as f64)
}

/// Fraction of a tile whose center is `dist` away from the center of a blast
/// circle of `radius` that counts as covered.
///
/// Falls off linearly across the band where the circle's edge crosses the
/// tile.
pub fn coverage(dist: f64, radius: f64) -> f64 {
    let (inner, outer) = (radius - HALF_DIAGONAL, radius + HALF_DIAGONAL);
    if dist <= inner {
        1.0
    } else if dist >= outer {
        0.0
    } else {
        ((outer - dist) / (outer - inner)).clamp(0.0, 1.0)
    }
}

impl Game {
    /// World positions of the held pattern, or a logged refusal.
    fn activation_vertices(&mut self) -> Option<Vec<DVec2>> {
        if self.level.pattern.is_empty() {
            msg!(self, "No pattern defined.");
            return None;
        }
        if self.level.anchor.is_none() {
            msg!(self, "Pattern has no anchor.");
            return None;
        }
        Some(self.level.projected_vertices())
    }

    fn over_limit(&mut self, count: usize, limit: usize) -> bool {
        fizzle_roll(&mut self.rng, count.saturating_sub(limit), limit)
    }

    /// Take `cost` mana from the player, or log why not.
    fn spend_mana(&mut self, cost: i64) -> bool {
        let Some(stats) = self.player_stats_mut() else {
            return false;
        };
        if stats.mana < cost {
            let have = stats.mana;
            msg!(self, "Not enough mana ({have}/{cost}).");
            return false;
        }
        stats.mana -= cost;
        true
    }

    fn show_activation(&mut self, points: Vec<DVec2>) {
        self.level.activation_points = points;
        self.level.activation_ttl = self.cfg.pattern_overlay_ttl;
    }

    /// Whether an actor is fair game for the player's rune.
    pub(crate) fn rune_target(&self, id: EntityId) -> bool {
        id != self.player
            && self
                .level
                .entity(id)
                .is_some_and(|e| e.is_alive() && e.faction() != Some(Faction::Player))
    }

    /// Blast every vertex within the radius of the target vertex.
    pub(crate) fn activate_all(&mut self, target: Option<usize>) {
        let Some(verts) = self.activation_vertices() else {
            return;
        };
        if self.over_limit(verts.len(), self.character.coherence_limit()) {
            msg!(self, "This pattern strains your mind.");
            return;
        }
        let Some(&center) = target.and_then(|i| verts.get(i)) else {
            msg!(self, "Select a vertex to target the circle.");
            return;
        };

        let radius = self.params.float("activate_all", "radius", 1.0);
        let per_vertex = self.params.int("activate_all", "damage", 1);
        let active: Vec<DVec2> = verts
            .into_iter()
            .filter(|v| v.distance_squared(center) <= radius * radius)
            .collect();

        if self.over_limit(active.len(), self.character.strength_limit()) {
            msg!(self, "You strain to channel that many vertices at once and lose focus.");
            return;
        }
        if active.is_empty() {
            msg!(self, "No vertices in range of the target.");
            return;
        }
        let total = active.len() as i64;
        if !self.spend_mana(total) {
            return;
        }
        self.show_activation(active);

        let mut hits = 0;
        for id in self.level.actor_ids() {
            if !self.rune_target(id) {
                continue;
            }
            let Some(e) = self.level.entity(id) else {
                continue;
            };
            if !self.level.world.is_visible(e.pos) {
                continue;
            }
            let name = e.name.clone();
            let dist = e.pos.as_dvec2().distance(center);
            let dmg = (per_vertex as f64 * total as f64 * coverage(dist, radius)) as i64;
            if dmg <= 0 {
                continue;
            }
            let Some(hit) = self.hurt(self.zone, id, dmg) else {
                continue;
            };
            hits += 1;
            msg!(self, "Your rune sears {name} for {dmg}.");
            if hit.dead {
                msg!(self, "{name} is annihilated.");
                self.kill_actor(self.zone, id, true);
            }
        }

        if hits == 0 {
            msg!(self, "Your rune fizzles; no foes in its reach.");
        }
    }

    /// Channel the graph neighborhood of the target vertex.
    pub(crate) fn activate_seed(&mut self, target: Option<usize>) {
        let Some(verts) = self.activation_vertices() else {
            return;
        };
        let Some(seed) = target.filter(|&i| i < verts.len()) else {
            msg!(self, "Select a vertex to target.");
            return;
        };
        if self.over_limit(verts.len(), self.character.coherence_limit()) {
            msg!(self, "Your pattern destabilizes; the activation slips away.");
            return;
        }

        let depth = self.params.int("activate_seed", "neighbor_depth", 1).max(0) as usize;
        let active: Vec<DVec2> = self
            .level
            .pattern
            .neighborhood(seed, depth)
            .into_iter()
            .filter_map(|i| verts.get(i).copied())
            .collect();

        if self.over_limit(active.len(), self.character.strength_limit()) {
            msg!(self, "This weave challenges your focus.");
            return;
        }
        if !self.spend_mana(active.len() as i64) {
            return;
        }
        self.show_activation(active.clone());

        let per_vertex = self.params.int("activate_seed", "damage", 1);
        let mut hits = 0;
        for v in active {
            let Some(id) = self.level.actor_at(tile_of(v)) else {
                continue;
            };
            if !self.rune_target(id) {
                continue;
            }
            let name = self.level.entity(id).map_or(String::new(), |e| e.name.clone());
            let Some(hit) = self.hurt(self.zone, id, per_vertex) else {
                continue;
            };
            hits += 1;
            msg!(self, "Your focus bites {name} for {per_vertex}.");
            if hit.dead {
                msg!(self, "{name} crumbles.");
                self.kill_actor(self.zone, id, true);
            }
        }

        if hits == 0 {
            msg!(self, "Your focus fizzles; no foes in reach.");
        }
    }
}
