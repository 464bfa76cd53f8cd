//! Melee, damage, deaths and experience.

use util::RngExt;

use crate::{
    prelude::*, Brain, EntityId, EntityKind, Faction, Game, Item, ItemKind,
    Stat, UrgentEffect,
};

/// Outcome of damage dealt to an actor.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct Hit {
    pub dealt: i64,
    pub dead: bool,
}

impl Game {
    /// Experience needed to go from `level` to the next one.
    pub fn xp_needed(&self, level: i64) -> i64 {
        (self.cfg.xp_base + self.cfg.xp_per_level * (level - 1)).max(1)
    }

    /// Step or attack in direction `dir`.
    pub(crate) fn move_or_attack(
        &mut self,
        zc: IVec3,
        id: EntityId,
        dir: IVec2,
    ) -> Result<()> {
        self.step(zc, id, dir, true)
    }

    fn step(&mut self, zc: IVec3, id: EntityId, dir: IVec2, may_open: bool) -> Result<()> {
        let is_player = id == self.player;
        let Some(lvl) = self.lvl(zc) else {
            return Ok(());
        };
        let Some(ent) = lvl.entity(id).filter(|e| e.is_alive()) else {
            return Ok(());
        };
        let dest = ent.pos + dir;
        let faction = ent.faction();

        if !lvl.world.in_bounds(dest) {
            if is_player && zc == self.zone {
                self.transition_edge(dest)?;
            }
            return Ok(());
        }

        if let Some(target) = lvl.actor_at(dest).filter(|&t| t != id) {
            let theirs = lvl.entity(target).and_then(|e| e.faction());
            if let (Some(a), Some(b)) = (faction, theirs) {
                if a.opposes(b) {
                    self.attack(zc, id, target);
                    return Ok(());
                }
            }
            if is_player {
                let name = lvl.entity(target).map_or("Someone".into(), |e| e.name.clone());
                msg!(self, "{name} is in the way.");
            }
            return Ok(());
        }

        if let Some(blocker) = lvl.blocker_at(dest) {
            let is_door = lvl.entity(blocker).is_some_and(|e| e.is_closed_door());
            let name = lvl.entity(blocker).map_or(String::new(), |e| e.name.to_lowercase());
            if is_door && may_open {
                if let Some(lvl) = self.lvl_mut(zc) {
                    if let Some(door) = lvl.entity_mut(blocker) {
                        door.open_door();
                    }
                    lvl.need_fov = true;
                }
                if is_player {
                    msg!(self, "You open the door.");
                }
                return self.step(zc, id, dir, false);
            }
            if is_player {
                msg!(self, "You bump into the {name}.");
            }
            return Ok(());
        }

        if !lvl.world.is_walkable(dest) {
            if is_player {
                msg!(self, "You bump into a wall.");
            }
            return Ok(());
        }

        let Some(lvl) = self.lvl_mut(zc) else {
            return Ok(());
        };
        if let Some(e) = lvl.entity_mut(id) {
            e.pos = dest;
        }
        if !is_player {
            return Ok(());
        }
        lvl.need_fov = true;

        let seen = lvl
            .entity_at(dest)
            .filter(|e| e.id != id)
            .map(|e| e.a_name());
        let console = lvl.world.tile(dest).is_some_and(|t| t.is_console());
        if let Some(name) = seen {
            msg!(self, "You see here {name}.");
        }
        if console {
            msg!(self, "The console hums to life.");
            self.editor_requested = true;
        }
        Ok(())
    }

    /// Melee hit for a fixed 1 damage.
    pub(crate) fn attack(&mut self, zc: IVec3, attacker: EntityId, defender: EntityId) {
        let (Some(a), Some(d)) =
            (self.entity_in(zc, attacker), self.entity_in(zc, defender))
        else {
            return;
        };
        let a_name = a.name.clone();
        let d_name = d.name.clone();
        let bites_mana = a.actor().is_some_and(|a| a.brain == Brain::ManaBite);

        let Some(hit) = self.hurt(zc, defender, 1) else {
            return;
        };
        if attacker == self.player {
            msg!(self, "You hit {d_name} for {}.", hit.dealt);
        } else if defender == self.player {
            msg!(self, "{a_name} hits you for {}.", hit.dealt);
        } else {
            msg!(self, "{a_name} hits {d_name} for {}.", hit.dealt);
        }

        if bites_mana && !hit.dead {
            if let Some(stats) = self
                .entity_in_mut(zc, defender)
                .and_then(|e| e.actor_mut())
                .map(|a| &mut a.stats)
            {
                let before = stats.mana;
                stats.mana = (stats.mana - 2).max(0);
                if before > stats.mana && defender == self.player {
                    msg!(self, "You feel your mana drain away.");
                }
            }
        }

        if hit.dead {
            self.resolve_death(zc, defender, &a_name, attacker == self.player);
        }
    }

    /// Deal damage to an actor. `None` if there is no living actor to hurt.
    pub(crate) fn hurt(&mut self, zc: IVec3, id: EntityId, amount: i64) -> Option<Hit> {
        let e = self.entity_in_mut(zc, id)?;
        if !e.is_alive() {
            return None;
        }
        let stats = &mut e.actor_mut()?.stats;
        let dealt = stats.hurt(amount);
        Some(Hit {
            dealt,
            dead: !stats.alive(),
        })
    }

    /// Handle an actor dropping to zero hp.
    ///
    /// The player's death is an urgent message, anything else is removed.
    pub(crate) fn resolve_death(
        &mut self,
        zc: IVec3,
        id: EntityId,
        cause: &str,
        by_player: bool,
    ) {
        if id == self.player {
            self.player_died(cause);
            return;
        }
        let name = self.entity_in(zc, id).map_or(String::new(), |e| e.name.clone());
        msg!(self, "{name} dies.");
        self.kill_actor(zc, id, by_player);
    }

    pub(crate) fn player_died(&mut self, cause: &str) {
        log::info!("player died by way of {cause}");
        self.set_urgent(
            "You unravel...",
            format!("You have died by way of {cause}."),
            &["Continue..."],
            None::<UrgentEffect>,
        );
    }

    /// Remove a dead actor, paying out experience and loot.
    pub(crate) fn kill_actor(&mut self, zc: IVec3, id: EntityId, by_player: bool) {
        if id == self.player {
            return;
        }
        if by_player {
            self.award_kill_xp(zc, id);
        }
        let Some(lvl) = self.lvl_mut(zc) else {
            return;
        };
        let Some(body) = lvl.remove(id) else {
            return;
        };
        log::debug!("{} {id} removed from {zc}", body.name);

        let pos = body.pos;
        let walkable = lvl.world.is_walkable(pos);
        if !walkable || !self.rng.chance(self.cfg.currency_drop_chance) {
            return;
        }
        let (lo, hi) = (self.cfg.currency_min, self.cfg.currency_max.max(self.cfg.currency_min));
        let amount = rand::Rng::gen_range(&mut self.rng, lo..=hi);
        match self.make_item("coins", pos) {
            Ok(mut coins) => {
                if let EntityKind::Item(Item { amount: n, .. }) = &mut coins.kind {
                    *n = amount;
                }
                if let Some(lvl) = self.lvl_mut(zc) {
                    lvl.insert(coins);
                }
            }
            Err(e) => log::warn!("no currency drop: {e:#}"),
        }
    }

    /// Grant the kill experience of a hostile actor, once per actor.
    pub(crate) fn award_kill_xp(&mut self, zc: IVec3, id: EntityId) {
        let per_kill = self.cfg.xp_per_kill;
        let Some(actor) = self.entity_in_mut(zc, id).and_then(|e| e.actor_mut()) else {
            return;
        };
        let hostile = actor.faction == Faction::Hostile
            || actor.native_faction == Some(Faction::Hostile);
        if !hostile || actor.xp_awarded {
            return;
        }
        actor.xp_awarded = true;
        let xp = actor.xp_value.unwrap_or(per_kill);
        self.grant_xp(xp);
    }

    /// Add experience to the player, leveling up as many times as it pays
    /// for.
    pub fn grant_xp(&mut self, amount: i64) {
        if amount <= 0 {
            return;
        }
        let Some(stats) = self.player_stats_mut() else {
            return;
        };
        stats.xp += amount;

        loop {
            let Some(stats) = self.player_stats_mut() else {
                return;
            };
            if stats.xp_to_next <= 0 || stats.xp < stats.xp_to_next {
                break;
            }
            stats.xp -= stats.xp_to_next;
            stats.level += 1;
            let level = stats.level;
            self.level_up(level);
            let next = self.xp_needed(level);
            if let Some(stats) = self.player_stats_mut() {
                stats.xp_to_next = next;
            }
        }

        let level = self.player_stats().map_or(1, |s| s.level);
        let next = self.xp_needed(level);
        let max_coherence = self.character.attributes.int as i64 * 20;
        if let Some(stats) = self.player_stats_mut() {
            stats.xp_to_next = next;
            stats.max_coherence = max_coherence;
            stats.coherence = stats.coherence.min(max_coherence);
        }
    }

    fn level_up(&mut self, level: i64) {
        let attrs = self.character.attributes;
        let hp_gain = 5 + attrs.con as i64 * 2;
        let mana_gain = 5 + attrs.res as i64 * 2;
        if let Some(s) = self.player_stats_mut() {
            s.max_hp += hp_gain;
            s.max_mana += mana_gain;
            s.hp = s.max_hp;
            s.mana = s.max_mana;
        }

        let weights = self.character.class.stat_weights();
        if level % 2 == 1 {
            let stat = self
                .rng
                .pick_weighted(&weights)
                .copied()
                .unwrap_or(Stat::Res);
            self.character.attributes.bump(stat);
            msg!(self, "Your {stat} grows (+1).");
        } else {
            let stat = weights
                .iter()
                .fold(None::<(Stat, f64)>, |best, &(s, w)| match best {
                    Some((_, bw)) if bw >= w => best,
                    _ => Some((s, w)),
                })
                .map_or(Stat::Res, |(s, _)| s);
            self.character.attributes.bump(stat);
            msg!(self, "You focus your training: {stat} +1.");
        }
        self.params.auto_max(&self.character.attributes);

        self.set_urgent(
            "Level Up!",
            format!("You reach level {level}! (+{hp_gain} HP, +{mana_gain} MP)"),
            &["Continue..."],
            None,
        );

        if let Some(aura) = self.lorenz.as_mut() {
            aura.count += 1;
            aura.points.clear();
            msg!(self, "Another butterfly is attracted to the storm...");
        }
    }
}
