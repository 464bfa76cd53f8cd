//! Utility abilities and the pattern-color driven field effects.

use glam::DVec2;
use rand::seq::SliceRandom;
use util::{line_tiles, RngExt};

use crate::{
    prelude::*, tile_of, Dot, DotKind, Game, Motion, Pending, Rgb, Slow,
};

const TAUNT_VERBS: [&str; 14] = [
    "taunts",
    "jeers",
    "sneers",
    "snidely remarks",
    "shouts",
    "yells obnoxiously",
    "exclaims",
    "complains",
    "retorts",
    "snorts contemptuously",
    "parades about",
    "snickers",
    "screeches",
    "crows",
];

const TAUNTS: [&str; 10] = [
    "Wow, nice fractals, reeeaally cool. Nerrrrd!",
    "Thou unworthy cheesemaker, or whatever!",
    "Curses upon thy teeth! May they grow dull and moldy!",
    "Check out this annoying sound, WAAAAAAAA hahaha!",
    "Nobody likes you, they're just afraid to say it.",
    "Imps forever, imp pride!",
    "I hope you crash in an overflow error!",
    "I hope you get ambushed by an alligator.",
    "Berry hoarder!",
    "Your mom is self-similar!",
];

impl Game {
    /// Describe whatever is at `pos`.
    pub(crate) fn look(&mut self, zc: IVec3, actor: EntityId, pos: IVec2) {
        if actor != self.player {
            return;
        }
        let Some(lvl) = self.lvl(zc) else {
            return;
        };
        let (what, description) = match lvl.entity_at(pos) {
            Some(e) => (
                format!("You see here {}.", e.a_name()),
                e.tags.get("description").cloned(),
            ),
            None if !lvl.world.in_bounds(pos) => ("You see nothing there.".into(), None),
            None if lvl.world.is_walkable(pos) => ("You see nothing of note.".into(), None),
            None => ("You see a wall.".into(), None),
        };
        self.log.add(what);
        if let Some(d) = description {
            self.log.add(d);
        }
    }

    pub(crate) fn yawp(&mut self, zc: IVec3, actor: EntityId) {
        let who = self
            .entity_in(zc, actor)
            .map_or_else(|| "Something".to_string(), |e| e.name.clone());
        msg!(self, "{who} yawps! 'Yawp!'");
    }

    pub(crate) fn taunt(&mut self, zc: IVec3, actor: EntityId) {
        let Some(name) = self.entity_in(zc, actor).map(|e| e.name.clone()) else {
            return;
        };
        let verb = TAUNT_VERBS.choose(&mut self.rng).copied().unwrap_or("taunts");
        let line = TAUNTS.choose(&mut self.rng).copied().unwrap_or("Nyah!");
        msg!(self, "The {name} {verb}: \"{line}\"");
    }

    /// Blink to a random spot nearby at the risk of some self-harm.
    pub(crate) fn destabilize(&mut self, zc: IVec3, actor: EntityId) {
        const RADIUS: i32 = 10;
        let is_player = actor == self.player;
        let Some(lvl) = self.lvl(zc) else {
            return;
        };
        let Some(e) = lvl.entity(actor) else {
            return;
        };
        let (origin, name) = (e.pos, e.name.clone());
        let candidates: Vec<IVec2> = (-RADIUS..=RADIUS)
            .flat_map(|y| (-RADIUS..=RADIUS).map(move |x| origin + ivec2(x, y)))
            .filter(|&p| p == origin || lvl.is_free(p))
            .collect();

        if let Some(&dest) = candidates.choose(&mut self.rng) {
            if let Some(lvl) = self.lvl_mut(zc) {
                if let Some(e) = lvl.entity_mut(actor) {
                    e.pos = dest;
                }
                lvl.need_fov = true;
            }
            if is_player {
                msg!(self, "You destabilize and reappear at {},{}.", dest.x, dest.y);
            } else {
                msg!(self, "{name} flickers and reappears elsewhere.");
            }
        }

        if !self.rng.chance(0.5) {
            return;
        }
        let max_hp = self
            .entity_in(zc, actor)
            .and_then(|e| e.actor())
            .map_or(0, |a| a.stats.max_hp);
        let dmg = (max_hp / 10).max(1);
        let Some(hit) = self.hurt(zc, actor, dmg) else {
            return;
        };
        if is_player {
            msg!(self, "Chaos bites! You take {dmg} damage.");
            if hit.dead {
                self.player_died("destabilization");
            }
        } else {
            msg!(self, "{name} shudders from the destabilization.");
            if hit.dead {
                self.kill_actor(zc, actor, false);
            }
        }
    }

    pub(crate) fn meditate(&mut self, zc: IVec3, actor: EntityId) {
        let Some(stats) = self
            .entity_in_mut(zc, actor)
            .and_then(|e| e.actor_mut())
            .map(|a| &mut a.stats)
        else {
            return;
        };
        let restored = stats.restore_mana(10);
        if actor != self.player {
            return;
        }
        if restored > 0 {
            msg!(self, "You meditate and restore {restored} mana.");
        } else {
            msg!(self, "You meditate but feel already full of mana.");
        }
    }

    /// Breadth-first depths from the vertex nearest the anchor, if there
    /// is a pattern with edges to color.
    fn color_depths(&mut self) -> Option<Vec<usize>> {
        let p = &self.level.pattern;
        if p.edges().is_empty() || self.level.anchor.is_none() {
            msg!(self, "No pattern to color.");
            return None;
        }
        let root = p.nearest_vertex(DVec2::ZERO)?;
        Some(p.depths_from(root).into_iter().map(|d| d.unwrap_or(0)).collect())
    }

    /// Color the pattern in rainbow bands going outwards.
    pub(crate) fn rainbow(&mut self) {
        let Some(depth) = self.color_depths() else {
            return;
        };
        let band = |d: usize| Rgb::RAINBOW[d % Rgb::RAINBOW.len()];
        let p = &mut self.level.pattern;
        for (i, &d) in depth.iter().enumerate() {
            p.set_vertex_color(i, Some(band(d)));
        }
        let edges: Vec<(usize, usize)> = p.edges().iter().map(|e| (e.a, e.b)).collect();
        for (i, (a, b)) in edges.into_iter().enumerate() {
            p.set_edge_color(i, Some(band(depth[a].min(depth[b]))));
        }
        msg!(self, "Your pattern shimmers in every color.");
    }

    /// Color the pattern from white at the root to green at the far end.
    pub(crate) fn verdant(&mut self) {
        let Some(depth) = self.color_depths() else {
            return;
        };
        let deepest = depth.iter().copied().max().unwrap_or(0).max(1) as f64;
        let shade = |d: usize| Rgb::WHITE.lerp(Rgb::GREEN, d as f64 / deepest);
        let p = &mut self.level.pattern;
        for (i, &d) in depth.iter().enumerate() {
            p.set_vertex_color(i, Some(shade(d)));
        }
        let edges: Vec<(usize, usize)> = p.edges().iter().map(|e| (e.a, e.b)).collect();
        for (i, (a, b)) in edges.into_iter().enumerate() {
            p.set_edge_color(i, Some(shade(depth[a].max(depth[b]))));
        }
        msg!(self, "Green life creeps along your pattern.");
    }

    /// Set the pattern drifting towards `target`, turning `rotation`
    /// degrees per step.
    pub(crate) fn push_pattern(&mut self, target: DVec2, rotation: f64) {
        let (Some(anchor), Some(com)) =
            (self.level.anchor, self.level.pattern.center_of_mass())
        else {
            msg!(self, "No pattern to push.");
            return;
        };
        let mut delta = target - (anchor.as_dvec2() + com);
        if delta.length() > self.cfg.push_range {
            delta = delta.normalize_or_zero() * self.cfg.push_range;
        }
        self.level.motion = Some(Motion {
            delta,
            rotation,
            accum: 0,
        });
        msg!(self, "Your pattern begins to drift.");
    }

    pub(crate) fn motion_tick(&mut self, zc: IVec3, delta: i64) {
        let interval = self.cfg.motion_interval.max(1);
        let Some(lvl) = self.lvl_mut(zc) else {
            return;
        };
        let Some(mut motion) = lvl.motion.take() else {
            return;
        };
        if lvl.pattern.is_empty() || lvl.anchor.is_none() {
            return;
        }

        motion.accum += delta;
        while motion.accum >= interval {
            motion.accum -= interval;
            lvl.pattern.translate(motion.delta);
            if motion.rotation != 0.0 {
                if let Some(com) = lvl.pattern.center_of_mass() {
                    lvl.pattern.rotate_about(com, motion.rotation.to_radians());
                }
            }
        }

        let gone = lvl
            .projected_vertices()
            .into_iter()
            .all(|v| !lvl.world.in_bounds(tile_of(v)));
        if gone {
            log::debug!("pattern in {zc} drifted out of the zone");
        } else {
            lvl.motion = Some(motion);
        }
    }

    /// Start burning or healing along the colored edges of the pattern.
    pub(crate) fn start_dot(&mut self, kind: DotKind) {
        if self.level.anchor.is_none() || !self.level.pattern.has_colored_edges() {
            msg!(self, "Your pattern needs color first.");
            return;
        }
        let dot = Dot::new(kind, self.cfg.dot_duration.max(1));
        self.level.schedule(1, Pending::Dot(dot));
        match kind {
            DotKind::Ignite => msg!(self, "Your pattern bursts into flame."),
            DotKind::Regrow => msg!(self, "Your pattern blooms with living light."),
        }
    }

    /// Intensity per tile under the pattern's edges, 0..=1, with the tiles
    /// next to them at a reduced strength.
    fn dot_field(&self, zc: IVec3, kind: DotKind) -> HashMap<IVec2, f64> {
        let mut field: HashMap<IVec2, f64> = HashMap::default();
        let Some(lvl) = self.lvl(zc) else {
            return field;
        };
        let Some(anchor) = lvl.anchor else {
            return field;
        };
        let verts = lvl.pattern.vertices();
        for e in lvl.pattern.edges() {
            let Some(color) = e.color else { continue };
            let strength = match kind {
                DotKind::Ignite => color.redness(),
                DotKind::Regrow => color.greenness(),
            } as f64
                / 255.0;
            if strength <= 0.0 {
                continue;
            }
            let a = tile_of(anchor.as_dvec2() + verts[e.a].pos);
            let b = tile_of(anchor.as_dvec2() + verts[e.b].pos);
            for p in line_tiles(a, b) {
                let x = field.entry(p).or_insert(0.0);
                *x = x.max(strength);
            }
        }

        let mut indirect: HashMap<IVec2, f64> = HashMap::default();
        for (&p, &s) in &field {
            for d in DIR_8 {
                let q = p + d;
                if !field.contains_key(&q) {
                    let x = indirect.entry(q).or_insert(0.0);
                    *x = x.max(s * self.cfg.dot_indirect_factor);
                }
            }
        }
        field.extend(indirect);
        field
    }

    /// One tick of an ignite or regrow field.
    pub(crate) fn dot_tick(&mut self, zc: IVec3, mut dot: Dot) {
        let field = self.dot_field(zc, dot.kind);
        if field.is_empty() {
            return;
        }
        let rate = match dot.kind {
            DotKind::Ignite => self.cfg.ignite_rate,
            DotKind::Regrow => self.cfg.regrow_rate,
        };
        let decay = dot.remaining as f64 / dot.duration.max(1) as f64;

        let Some(ids) = self.lvl(zc).map(|l| l.actor_ids()) else {
            return;
        };
        for id in ids {
            let Some(e) = self.entity_in(zc, id).filter(|e| e.is_alive()) else {
                continue;
            };
            let Some(&strength) = field.get(&e.pos) else {
                continue;
            };
            let name = e.name.clone();
            if dot.kind == DotKind::Ignite && id == self.player {
                continue;
            }
            let whole = dot.accrue(id, rate * strength * decay);
            if whole <= 0 {
                continue;
            }
            match dot.kind {
                DotKind::Ignite => {
                    let Some(hit) = self.hurt(zc, id, whole) else {
                        continue;
                    };
                    msg!(self, "{name} burns for {whole}.");
                    if hit.dead {
                        msg!(self, "{name} is consumed by flame.");
                        self.kill_actor(zc, id, true);
                    }
                }
                DotKind::Regrow => {
                    let healed = self
                        .entity_in_mut(zc, id)
                        .and_then(|e| e.actor_mut())
                        .map_or(0, |a| a.stats.heal(whole));
                    if healed > 0 {
                        if id == self.player {
                            msg!(self, "The living light mends you for {healed}.");
                        } else {
                            msg!(self, "{name} is mended for {healed}.");
                        }
                    }
                }
            }
        }

        dot.remaining -= 1;
        if dot.remaining > 0 {
            if let Some(lvl) = self.lvl_mut(zc) {
                lvl.schedule(1, Pending::Dot(dot));
            }
        }
    }

    /// Chill whatever stands under the blue vertices of the pattern.
    pub(crate) fn freeze(&mut self) {
        let Some(anchor) = self.level.anchor else {
            msg!(self, "No pattern to freeze with.");
            return;
        };
        let mut cold: IndexMap<IVec2, f64> = IndexMap::default();
        for v in self.level.pattern.vertices() {
            let Some(color) = v.color else { continue };
            let b = color.blueness() as f64 / 255.0;
            if b > 0.0 {
                *cold.entry(tile_of(anchor.as_dvec2() + v.pos)).or_insert(0.0) += b;
            }
        }
        if cold.is_empty() {
            msg!(self, "Your pattern holds no cold.");
            return;
        }

        let (dmg_scale, slow_scale, cap) = (
            self.cfg.freeze_damage,
            self.cfg.freeze_slow_scale,
            self.cfg.freeze_slow_cap,
        );
        let mut hits = 0;
        for (pos, sum) in cold {
            let Some(id) = self.level.actor_at(pos) else {
                continue;
            };
            if !self.rune_target(id) {
                continue;
            }
            let name = self.level.entity(id).map_or(String::new(), |e| e.name.clone());
            let dmg = ((sum * dmg_scale).floor() as i64).max(1);
            let factor = (1.0 + sum * slow_scale).min(cap);
            let Some(hit) = self.hurt(self.zone, id, dmg) else {
                continue;
            };
            hits += 1;
            msg!(self, "{name} is frozen for {dmg}.");
            if hit.dead {
                msg!(self, "{name} shatters.");
                self.kill_actor(self.zone, id, true);
            } else if let Some(a) = self.level.entity_mut(id).and_then(|e| e.actor_mut()) {
                a.slow = Some(Slow { factor, timer: 0 });
            }
        }
        if hits == 0 {
            msg!(self, "Frost spreads but finds no foe.");
        }
    }
}
