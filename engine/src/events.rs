//! Overworld happenings and conversations with NPCs.

use rand::{seq::SliceRandom, Rng};
use strum::{EnumIter, IntoEnumIterator};
use util::RngExt;

use crate::{
    game::UrgentEffect, prelude::*, ActionKind, EntityKind, Faction, Game,
    ItemKind, Status,
};

const BLESSING_TICKS: i64 = 200;
/// Long enough to never wear off in a normal run.
const CURSE_TICKS: i64 = 10_000;
/// Generators the mentor can pass on.
const TEACHABLE: [ActionKind; 3] = [ActionKind::Koch, ActionKind::Branch, ActionKind::Zigzag];

#[derive(Copy, Clone, Eq, PartialEq, Debug, EnumIter)]
pub enum OverworldEvent {
    Alligator,
    ImpsAplenty,
    BerryGlut,
    BeggarlyVagrant,
}

impl OverworldEvent {
    pub fn title(self) -> &'static str {
        use OverworldEvent::*;
        match self {
            Alligator => "An alligator!",
            ImpsAplenty => "Imps aplenty",
            BerryGlut => "Berry glut",
            BeggarlyVagrant => "Beggarly Vagrant",
        }
    }

    pub fn body(self) -> &'static str {
        use OverworldEvent::*;
        match self {
            Alligator => "An alligator leaps out of nowhere and snaps you on the leg.",
            ImpsAplenty => "A cackle of imps erupts from a yawn in the earth.",
            BerryGlut => "The season is ripe for propagation.",
            BeggarlyVagrant => {
                "A tall man with kingly bearing, crusted and worn by years of regret. \
                 \"I am cursed to wander these fruitless lands. Will you quench my longing?\""
            }
        }
    }

    pub fn choices(self) -> &'static [&'static str] {
        use OverworldEvent::*;
        match self {
            Alligator => &["That hurts"],
            ImpsAplenty => &["Foul vermin!"],
            BerryGlut => &["Impressive foliage..."],
            BeggarlyVagrant => &[
                "Give him a berry",
                "Nothing to spare",
                "Pluck out his eyes and eat them like berries",
            ],
        }
    }

    /// Relative odds of the event being picked.
    pub fn weight(self) -> f64 {
        1.0
    }
}

impl Game {
    /// Raise a random overworld event as an urgent message.
    pub fn trigger_event(&mut self) {
        let table: Vec<(OverworldEvent, f64)> =
            OverworldEvent::iter().map(|e| (e, e.weight())).collect();
        let Some(&ev) = self.rng.pick_weighted(&table) else {
            return;
        };
        log::debug!("overworld event {ev:?}");
        self.set_urgent(ev.title(), ev.body(), ev.choices(), Some(UrgentEffect::Event(ev)));
    }

    pub(crate) fn apply_event(&mut self, ev: OverworldEvent, choice: usize) -> Result<()> {
        let Some(pos) = self.player_pos() else {
            return Ok(());
        };
        match ev {
            OverworldEvent::Alligator => {
                let Some(s) = self.player_stats_mut() else {
                    return Ok(());
                };
                let bite = (s.hp / 2).max(1);
                s.hurt(bite);
                let dead = !s.alive();
                msg!(self, "The alligator mauls your leg! You lose half your health.");
                if dead {
                    self.player_died("a surprise alligator");
                }
            }
            OverworldEvent::ImpsAplenty => {
                let n = self.rng.gen_range(3..=8);
                let mut spawned = 0;
                for p in self.free_tiles_near(pos, 3, n) {
                    self.spawn_enemy_at("imp", p)?;
                    spawned += 1;
                }
                match spawned {
                    0 => msg!(self, "The ground shudders, but nothing emerges..."),
                    1 => msg!(self, "A cackle of 1 imp crawls out of the yawning earth!"),
                    n => msg!(self, "A cackle of {n} imps crawls out of the yawning earth!"),
                }
            }
            OverworldEvent::BerryGlut => {
                let n = self.rng.gen_range(8..=12);
                let berries = self.content.berry_ids();
                let mut spawned = 0;
                for p in self.free_tiles_near(pos, 3, n) {
                    let Some(&id) = berries.choose(&mut self.rng) else {
                        break;
                    };
                    let e = self.make_item(id, p)?;
                    self.level.insert(e);
                    spawned += 1;
                }
                match spawned {
                    0 => msg!(self, "The foliage shivers, but nothing seems to take root..."),
                    1 => msg!(self, "The season ripens in an instant. 1 berry bush bursts into being around you."),
                    n => msg!(self, "The season ripens in an instant. {n} berry bushes burst into being around you."),
                }
            }
            OverworldEvent::BeggarlyVagrant => self.vagrant(choice),
        }
        Ok(())
    }

    fn vagrant(&mut self, choice: usize) {
        let gave = choice == 0 && self.take_berry();
        if gave {
            if let Some(e) = self.player_mut() {
                e.statuses.remove(&Status::Cursed);
                let n = e.statuses.entry(Status::Blessed).or_insert(0);
                *n = (*n).max(BLESSING_TICKS);
            }
            msg!(self, "You feel a gentle warmth settle over you.");
            self.set_urgent(
                "A Quiet Benediction",
                "Even the smallest gesture may bring incommensurate joy. \
                 The man beams with renewed vigor and ineffable gratitude.",
                &["May you find solace."],
                None,
            );
        } else if choice == 2 {
            self.set_urgent(
                "A Feast of Eyeballs",
                "The man offers no resistance, welcoming blindness as a mercy. \
                 The eyeberries taste tart.",
                &["Twice the eyeballs..."],
                None,
            );
            if let Some(e) = self.player_mut() {
                if !e.has_status(Status::Cursed) {
                    e.statuses.insert(Status::Cursed, CURSE_TICKS);
                }
            }
            msg!(self, "A vertiginous chill grips you. The world feels subtly wrong.");
        } else {
            self.set_urgent(
                "Parting of Beggars",
                "His brow furrows, his eyes soften. \
                 \"I expected no more, and no less. Farewell, fellow beggar.\"",
                &["Part ways."],
                None,
            );
        }
    }

    /// Remove one berry from anywhere in the host's inventory tree.
    fn take_berry(&mut self) -> bool {
        let mut stack = vec![self.player];
        let mut seen = HashSet::default();
        while let Some(owner) = stack.pop() {
            if !seen.insert(owner) {
                continue;
            }
            let inv = self.inventory(owner);
            if let Some(i) = inv
                .iter()
                .position(|e| e.item().is_some_and(|i| i.kind == ItemKind::Berry))
            {
                if let Some(v) = self.inventories.get_mut(&owner) {
                    v.remove(i);
                }
                return true;
            }
            stack.extend(inv.iter().map(|e| e.id));
        }
        false
    }

    /// Up to `n` distinct random free tiles within `radius` of `center`.
    fn free_tiles_near(&mut self, center: IVec2, radius: i32, n: usize) -> Vec<IVec2> {
        let mut ret = Vec::new();
        for _ in 0..n * 20 {
            if ret.len() >= n {
                break;
            }
            let p = center
                + ivec2(
                    self.rng.gen_range(-radius..=radius),
                    self.rng.gen_range(-radius..=radius),
                );
            if ret.contains(&p) || !self.level.is_free(p) || self.level.entity_at(p).is_some() {
                continue;
            }
            ret.push(p);
        }
        ret
    }

    // Conversation.

    fn adjacent_npc(&self) -> Option<EntityId> {
        let pos = self.player_pos()?;
        self.level
            .actors()
            .find(|e| {
                e.is_alive()
                    && e.faction() == Some(Faction::Npc)
                    && (e.pos - pos).cheb_len() == 1
            })
            .map(|e| e.id)
    }

    /// Talk to a friendly neighbour.
    pub fn talk(&mut self) {
        let Some(id) = self.adjacent_npc() else {
            msg!(self, "No one nearby to talk to.");
            return;
        };
        let Some(e) = self.level.entity(id) else {
            return;
        };
        let name = e.name.clone();
        let npc_id = match &e.kind {
            EntityKind::Actor(a) => a.npc.clone(),
            _ => None,
        };
        let Some(def) = npc_id.and_then(|n| self.content.npc(&n).ok()).cloned() else {
            self.set_urgent(name.clone(), format!("{name} waits patiently."), &["Farewell"], None);
            return;
        };

        let mut body = def.dialogue.join(" ");
        if def.opens_editor {
            self.set_urgent(
                name,
                body,
                &["Let's draft", "Maybe later"],
                Some(UrgentEffect::Draft(def.id.to_string())),
            );
        } else if def.teaches {
            let options: Vec<ActionKind> = TEACHABLE
                .into_iter()
                .filter(|k| !self.character.unlocked.contains(k))
                .collect();
            if options.is_empty() {
                body.push_str(" You already know every pattern I can teach.");
                self.set_urgent(name, body, &["Farewell"], None);
                return;
            }
            let labels: Vec<String> = options.iter().map(|k| title_case(*k)).collect();
            let mut choices: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
            choices.push("Never mind");
            self.set_urgent(name, body, &choices, Some(UrgentEffect::Teach(options)));
        } else {
            self.set_urgent(name, body, &["Farewell"], None);
        }
    }

    pub(crate) fn finish_teaching(&mut self, options: &[ActionKind], choice: usize) {
        let Some(&kind) = options.get(choice) else {
            msg!(self, "You end the conversation.");
            return;
        };
        if self.character.unlocked.contains(&kind) {
            msg!(self, "You already know {}.", title_case(kind));
            return;
        }
        self.character.unlocked.push(kind);
        self.character.generator = kind;
        self.grant_ability(kind);
        msg!(self, "{} added to your repertoire.", title_case(kind));
    }

    pub(crate) fn finish_drafting(&mut self, npc: &str, choice: usize) {
        if choice != 0 {
            msg!(self, "Maybe another time.");
            return;
        }
        self.editor_requested = true;
        match npc {
            "hexmage" => msg!(self, "The Hexmage opens a hexagonal drafting grid."),
            "cartographer" => msg!(self, "The Cartographer unrolls a wide rectangular grid."),
            _ => msg!(self, "A drafting grid unrolls before you."),
        }
    }
}

fn title_case(kind: ActionKind) -> String {
    let s = kind.to_string();
    let mut cs = s.chars();
    match cs.next() {
        Some(c) => c.to_uppercase().chain(cs).collect(),
        None => s,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::test::*;

    fn npc_next_to_player(g: &mut Game, id: &str) -> EntityId {
        let pos = g.player_pos().unwrap() + ivec2(1, 0);
        let e = g.make_npc(id, pos).unwrap();
        g.level.insert(e)
    }

    #[test]
    fn alligator_halves_hp() {
        let mut g = game(70);
        clear_zone(&mut g);
        let hp = g.player_stats().unwrap().hp;
        g.set_urgent("t", "b", &["Ok"], Some(UrgentEffect::Event(OverworldEvent::Alligator)));
        g.resolve_urgent(0).unwrap();
        assert_eq!(g.player_stats().unwrap().hp, hp - hp / 2);
        assert_eq!(
            g.log.last(),
            Some("The alligator mauls your leg! You lose half your health.")
        );
    }

    #[test]
    fn imps_and_berries_appear_nearby() {
        let mut g = game(71);
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();
        g.apply_event(OverworldEvent::ImpsAplenty, 0).unwrap();
        let imps: Vec<IVec2> = g
            .level
            .actors()
            .filter(|e| e.id != g.player_id())
            .map(|e| e.pos)
            .collect();
        assert!((3..=8).contains(&imps.len()));
        assert!(imps.iter().all(|p| (*p - pos).cheb_len() <= 3));

        g.apply_event(OverworldEvent::BerryGlut, 0).unwrap();
        let berries = g
            .level
            .entities()
            .filter(|e| e.item().is_some_and(|i| i.kind == ItemKind::Berry))
            .count();
        assert!((8..=12).contains(&berries));
    }

    #[test]
    fn vagrant_blesses_and_curses() {
        let mut g = game(72);
        clear_zone(&mut g);

        // No berry to give.
        g.apply_event(OverworldEvent::BeggarlyVagrant, 0).unwrap();
        assert_eq!(g.urgent().unwrap().title, "Parting of Beggars");
        g.resolve_urgent(0).unwrap();
        assert!(!g.player().unwrap().has_status(Status::Blessed));

        g.apply_event(OverworldEvent::BeggarlyVagrant, 2).unwrap();
        assert!(g.player().unwrap().has_status(Status::Cursed));
        g.resolve_urgent(0).unwrap();

        let pos = g.player_pos().unwrap();
        let berry = g.make_item("blueberry", pos).unwrap();
        g.level.insert(berry);
        g.pick_up();
        g.apply_event(OverworldEvent::BeggarlyVagrant, 0).unwrap();
        assert!(g.player_inventory().is_empty());
        let me = g.player().unwrap();
        assert!(me.has_status(Status::Blessed));
        assert!(!me.has_status(Status::Cursed));
        assert_eq!(g.urgent().unwrap().title, "A Quiet Benediction");
    }

    #[test]
    fn events_are_raised_as_urgent() {
        let mut g = game(73);
        g.trigger_event();
        let u = g.urgent().unwrap();
        assert!(OverworldEvent::iter().any(|e| e.title() == u.title));
        assert!(!u.choices.is_empty());
    }

    #[test]
    fn mentor_teaches_generators() {
        let mut g = game(74);
        clear_zone(&mut g);
        g.talk();
        assert_eq!(g.log.last(), Some("No one nearby to talk to."));

        npc_next_to_player(&mut g, "mentor");
        g.talk();
        let u = g.urgent().unwrap();
        assert_eq!(u.choices, vec!["Koch", "Branch", "Zigzag", "Never mind"]);
        g.resolve_urgent(1).unwrap();
        assert_eq!(g.log.last(), Some("Branch added to your repertoire."));
        assert_eq!(g.character.generator, ActionKind::Branch);
        assert!(g
            .player()
            .and_then(|e| e.actor())
            .unwrap()
            .actions
            .contains(&ActionKind::Branch));

        g.talk();
        assert_eq!(g.urgent().unwrap().choices, vec!["Koch", "Zigzag", "Never mind"]);
        g.resolve_urgent(2).unwrap();
        assert_eq!(g.log.last(), Some("You end the conversation."));
    }

    #[test]
    fn hexmage_opens_editor() {
        let mut g = game(75);
        clear_zone(&mut g);
        npc_next_to_player(&mut g, "hexmage");
        g.talk();
        g.resolve_urgent(1).unwrap();
        assert!(!g.editor_requested);
        g.talk();
        g.resolve_urgent(0).unwrap();
        assert!(g.editor_requested);
        assert_eq!(g.log.last(), Some("The Hexmage opens a hexagonal drafting grid."));
    }
}
