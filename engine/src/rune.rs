//! Laying down and reshaping the player's rune.

use glam::DVec2;

use crate::{
    cleanup_duplicates, prelude::*, Action, Game, Generator, Pattern, Pending,
};

impl Game {
    /// Enter terminus selection.
    pub(crate) fn begin_place(&mut self) {
        self.level.awaiting_terminus = true;
        msg!(self, "Select terminus within {} tiles.", self.cfg.place_range);
    }

    /// Lay a new pattern from the player out to `terminus`.
    ///
    /// Only answers a preceding `Place`. The line appears once the
    /// placement delay has passed.
    pub fn try_place_terminus(&mut self, terminus: IVec2) {
        if !self.level.awaiting_terminus {
            return;
        }
        let Some(pos) = self.player_pos() else {
            return;
        };
        if (terminus - pos).as_dvec2().length() > self.cfg.place_range {
            msg!(self, "Out of range.");
            return;
        }
        let delay = self.cfg.place_time_ticks;
        self.level.awaiting_terminus = false;
        self.level.schedule(
            delay,
            Pending::PlaceTerminus {
                anchor: pos,
                terminus,
            },
        );
        self.advance_time(self.zone, delay);
    }

    pub(crate) fn place_terminus(&mut self, zc: IVec3, anchor: IVec2, terminus: IVec2) {
        let Some(lvl) = self.lvl_mut(zc) else {
            return;
        };
        lvl.clear_pattern();
        lvl.pattern = Pattern::line(DVec2::ZERO, (terminus - anchor).as_dvec2());
        lvl.anchor = Some(anchor);
        msg!(self, "Terminus placed at ({}, {}).", terminus.x, terminus.y);
    }

    /// Replace the held pattern, anchored at world tile `anchor`.
    pub fn install_pattern(&mut self, anchor: IVec2, pattern: Pattern) {
        self.level.clear_pattern();
        self.level.pattern = pattern;
        self.level.anchor = Some(anchor);
    }

    /// Rewrite the held pattern with one of the generators.
    pub(crate) fn fractal_op(&mut self, action: &Action) {
        if self.level.pattern.is_empty() {
            msg!(self, "No pattern to modify. Place a terminus first.");
            return;
        }
        let p = &self.params;
        let generator = match action {
            Action::Subdivide => Generator::Subdivide {
                parts: p.int("subdivide", "parts", 2).max(1) as usize,
            },
            Action::Extend => Generator::Extend,
            Action::Koch => Generator::Koch {
                height: p.float("koch", "height", 0.25),
                flip: p.flag("koch", "flip"),
            },
            Action::Branch => Generator::Branch {
                angle_deg: p.int("branch", "angle", 30) as f64,
                count: p.int("branch", "count", 2).max(1) as usize,
                length_factor: 0.45,
            },
            Action::Zigzag => Generator::Zigzag {
                parts: p.int("zigzag", "parts", 4).max(1) as usize,
                amp: p.float("zigzag", "amp", 0.1),
            },
            Action::Custom(slot) => {
                let shape = self
                    .character
                    .custom_patterns
                    .get(*slot)
                    .filter(|s| s.len() >= 2);
                let Some(shape) = shape else {
                    msg!(self, "No custom pattern saved.");
                    return;
                };
                Generator::Custom {
                    shape: shape.clone(),
                    amplitude: p.float("custom", "amplitude", 1.0),
                }
            }
            _ => return,
        };

        let max = self.cfg.max_vertices;
        let segments = generator.apply(&self.level.pattern.to_segments(), max);
        let mut pattern = Pattern::from_segments(&cleanup_duplicates(segments));
        if pattern.len() > max {
            log::warn!("pattern of {} vertices capped to {max}", pattern.len());
            pattern.truncate(max);
            msg!(self, "Pattern capped at max vertices.");
        }
        self.level.pattern = pattern;
    }

    /// Drop the held pattern and recover full coherence.
    pub(crate) fn reset_rune(&mut self) {
        self.level.clear_pattern();
        if let Some(s) = self.player_stats_mut() {
            s.coherence = s.max_coherence;
        }
        msg!(self, "Rune reset.");
    }

    /// Step a generator parameter, gated by the character's attributes.
    pub fn adjust_param(&mut self, owner: &str, key: &str, delta: i32) -> (bool, String) {
        self.params
            .adjust(owner, key, delta, &self.character.attributes)
    }

    /// Store a shape drawn in the editor, returning its custom slot.
    pub fn save_custom_pattern(&mut self, shape: Pattern) -> Option<usize> {
        if shape.len() < 2 {
            msg!(self, "A custom pattern needs at least two vertices.");
            return None;
        }
        self.character.custom_patterns.push(shape);
        let slot = self.character.custom_patterns.len() - 1;
        if let Some(a) = self.player_mut().and_then(|e| e.actor_mut()) {
            if !a.actions.contains(&crate::ActionKind::Custom) {
                a.actions.push(crate::ActionKind::Custom);
            }
        }
        msg!(self, "Custom pattern saved.");
        Some(slot)
    }
}

#[cfg(test)]
mod test {
    use glam::dvec2;

    use super::*;
    use crate::{game::test::*, Character, Config};

    #[test]
    fn placement_takes_time() {
        let mut g = game(30);
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();

        g.queue_player_action(Action::Place).unwrap();
        assert!(g.level.awaiting_terminus);
        assert_eq!(g.log.last(), Some("Select terminus within 8 tiles."));

        let t = g.now();
        g.try_place_terminus(pos + ivec2(9, 0));
        assert_eq!(g.log.last(), Some("Out of range."));
        assert_eq!(g.now(), t);

        g.try_place_terminus(pos + ivec2(4, 3));
        assert_eq!(g.now(), t + Config::default().place_time_ticks);
        assert!(!g.level.awaiting_terminus);
        assert_eq!(g.level.anchor, Some(pos));
        assert_eq!(g.level.pattern.len(), 2);
        assert_eq!(g.level.pattern.vertices()[1].pos, dvec2(4.0, 3.0));
    }

    #[test]
    fn terminus_needs_place_first() {
        let mut g = game(34);
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();
        let t = g.now();
        g.try_place_terminus(pos + ivec2(3, 0));
        assert!(g.level.pattern.is_empty());
        assert_eq!(g.level.anchor, None);
        assert_eq!(g.now(), t);

        // A body without the rune kit never gets to pick a terminus.
        let attractor = Character {
            class: crate::PlayerClass::StrangeAttractor,
            seed: Some(35),
            ..Character::default()
        };
        let mut g = Game::new(Config::default(), attractor, crate::ActionRegistry::standard())
            .unwrap();
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();
        g.queue_player_action(Action::Place).unwrap();
        assert_eq!(g.log.last(), Some("You don't know how to do that."));
        assert!(!g.level.awaiting_terminus);
        g.try_place_terminus(pos + ivec2(3, 0));
        assert!(g.level.pattern.is_empty());
    }

    #[test]
    fn generators_rewrite_in_place() {
        let mut g = game(31);
        clear_zone(&mut g);
        g.queue_player_action(Action::Subdivide).unwrap();
        assert_eq!(g.log.last(), Some("No pattern to modify. Place a terminus first."));

        let pos = g.player_pos().unwrap();
        g.install_pattern(pos, Pattern::line(DVec2::ZERO, dvec2(6.0, 0.0)));
        // INT 2 unlocks three-way subdivision.
        g.queue_player_action(Action::Subdivide).unwrap();
        assert_eq!(g.level.pattern.len(), 4);

        g.queue_player_action(Action::Custom(0)).unwrap();
        assert_eq!(g.log.last(), Some("No custom pattern saved."));
        assert_eq!(g.level.pattern.len(), 4);

        let shape = Pattern::from_graph(
            vec![DVec2::ZERO, dvec2(0.5, 0.5), dvec2(1.0, 0.0)],
            vec![(0, 1), (1, 2)],
        )
        .unwrap();
        assert_eq!(g.save_custom_pattern(shape), Some(0));
        g.queue_player_action(Action::Custom(0)).unwrap();
        assert_eq!(g.level.pattern.len(), 7);
    }

    #[test]
    fn vertex_cap() {
        let mut g = game(32);
        clear_zone(&mut g);
        g.cfg.max_vertices = 4;
        let pos = g.player_pos().unwrap();
        g.install_pattern(pos, Pattern::line(DVec2::ZERO, dvec2(6.0, 0.0)));
        g.params.auto_max(&crate::Attributes::new(0, 0, 99, 0));
        for _ in 0..3 {
            g.queue_player_action(Action::Subdivide).unwrap();
        }
        assert!(g.level.pattern.len() <= 4);
        assert!(g.log.mentions("Pattern capped at max vertices."));
    }

    #[test]
    fn reset_restores_coherence() {
        let mut g = game(33);
        let pos = g.player_pos().unwrap();
        g.install_pattern(pos, Pattern::line(DVec2::ZERO, dvec2(2.0, 0.0)));
        g.player_stats_mut().unwrap().coherence = 1;
        g.queue_player_action(Action::Reset).unwrap();
        assert!(g.level.pattern.is_empty());
        assert_eq!(g.level.anchor, None);
        let s = g.player_stats().unwrap();
        assert_eq!(s.coherence, s.max_coherence);
        assert_eq!(g.log.last(), Some("Rune reset."));
    }
}
