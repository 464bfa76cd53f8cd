//! Zone lifecycle: generation, spawning and moving the player between zones.

use anyhow::bail;
use rand::{seq::SliceRandom, Rng};

use crate::{
    mapgen::{self, Layout},
    prelude::*,
    Actor, Entity, EntityId, EntityKind, Faction, Feature, Game, Item, Level,
    Pending, Rgb, Stats, World,
};

/// Where an arriving player gets placed in the destination zone.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Arrival {
    At(IVec2),
    UpStairs,
    DownStairs,
    Entry,
}

impl Arrival {
    fn resolve(self, lvl: &Level) -> IVec2 {
        let world = &lvl.world;
        let pos = match self {
            Arrival::At(p) if world.is_walkable(p) => p,
            Arrival::UpStairs => world.up_stairs.unwrap_or(world.entry),
            Arrival::DownStairs => world.down_stairs.unwrap_or(world.entry),
            _ => world.entry,
        };
        if lvl.is_free(pos) {
            pos
        } else {
            lvl.nearest_free(pos, 12).unwrap_or(pos)
        }
    }
}

/// Entry-relative spots tried for the destabilizer, in order.
const TRINKET_SPOTS: [IVec2; 9] = [
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(2, 0),
    IVec2::new(0, 2),
    IVec2::new(-2, 0),
    IVec2::new(0, -2),
];

/// Ability trinkets laid out in the lab.
const LAB_ITEMS: [&str; 6] = ["prism", "verdigris", "ember", "seedling", "rime", "lodestone"];

impl Game {
    // Entity factories.

    pub(crate) fn make_enemy(&mut self, template: &str, pos: IVec2) -> Result<Entity> {
        let t = self.content.enemy_or_fallback(template)?.clone();
        let stats = Stats {
            hp: t.hp,
            max_hp: t.hp,
            level: 1,
            ..Default::default()
        };
        let mut actor = Actor::new(t.faction, stats);
        actor.actions = t.actions.clone();
        actor.brain = t.brain;
        actor.species = Some(t.species.to_string());
        actor.xp_value = t.xp;

        let mut e = Entity::new(self.alloc_id(), t.name, EntityKind::Actor(actor));
        e.pos = pos;
        e.glyph = t.glyph;
        e.color = t.color;
        e.template = Some(t.id.to_string());
        Ok(e)
    }

    pub(crate) fn make_item(&mut self, template: &str, pos: IVec2) -> Result<Entity> {
        let t = self.content.entity(template)?.clone();
        let item = Item {
            kind: t.kind,
            grants_ability: t.grants_ability,
            amount: 1,
        };
        let mut e = Entity::new(self.alloc_id(), t.name, EntityKind::Item(item));
        e.pos = pos;
        e.glyph = t.glyph;
        e.color = t.color;
        e.template = Some(t.id.to_string());
        e.tags.insert("description".into(), t.description.into());
        Ok(e)
    }

    pub(crate) fn make_npc(&mut self, id: &str, pos: IVec2) -> Result<Entity> {
        let def = self.content.npc(id)?.clone();
        let hp = if def.faction == Faction::Hostile { 30 } else { 10 };
        let stats = Stats {
            hp,
            max_hp: hp,
            level: 1,
            ..Default::default()
        };
        let mut actor = Actor::new(def.faction, stats);
        actor.brain = crate::Brain::Idle;
        actor.npc = Some(def.id.to_string());
        actor.species = Some(def.id.to_string());

        let mut e = Entity::new(self.alloc_id(), def.name, EntityKind::Actor(actor));
        e.pos = pos;
        e.glyph = def.glyph;
        e.color = def.color;
        e.tags.insert("description".into(), def.description.into());
        Ok(e)
    }

    pub(crate) fn make_door(&mut self, pos: IVec2) -> Entity {
        let mut e = Entity::new(
            self.alloc_id(),
            "Door",
            EntityKind::Feature(Feature::Door { open: false }),
        );
        e.pos = pos;
        e.glyph = '+';
        e.color = Rgb(170, 120, 60);
        e
    }

    pub(crate) fn insert_into(&mut self, zc: IVec3, e: Entity) -> Option<EntityId> {
        self.lvl_mut(zc).map(|l| l.insert(e))
    }

    /// Random free tile away from the zone's rim.
    fn random_free(&mut self, zc: IVec3) -> Option<IVec2> {
        let (w, h) = {
            let world = &self.lvl(zc)?.world;
            (world.width(), world.height())
        };
        if w < 3 || h < 3 {
            return None;
        }
        for _ in 0..200 {
            let pos = ivec2(self.rng.gen_range(1..=w - 2), self.rng.gen_range(1..=h - 2));
            let lvl = self.lvl(zc)?;
            if lvl.is_free(pos) && lvl.entity_at(pos).is_none() {
                return Some(pos);
            }
        }
        None
    }

    /// Scatter up to `count` random hostiles over a zone and start their
    /// turns.
    pub fn spawn_enemies(&mut self, zc: IVec3, count: usize) -> Result<usize> {
        let ids = self.content.hostile_ids();
        let fast = self.cfg.action_time_fast;
        let Some((w, h)) = self.lvl(zc).map(|l| (l.world.width(), l.world.height())) else {
            bail!("No zone at {zc}");
        };
        if w < 3 || h < 3 {
            return Ok(0);
        }

        let mut placed = 0;
        for _ in 0..200 {
            if placed >= count {
                break;
            }
            let pos = ivec2(self.rng.gen_range(1..=w - 2), self.rng.gen_range(1..=h - 2));
            // Keep arrival spots clear.
            let open = self.lvl(zc).is_some_and(|l| {
                l.is_free(pos)
                    && pos != l.world.entry
                    && l.world.tile(pos).is_some_and(|t| !t.is_stairs())
            });
            if !open {
                continue;
            }
            let Some(&template) = ids.choose(&mut self.rng) else {
                break;
            };
            let e = self.make_enemy(template, pos)?;
            if let Some(lvl) = self.lvl_mut(zc) {
                let id = lvl.insert(e);
                lvl.schedule(fast, Pending::ActorTurn(id));
                placed += 1;
            }
        }
        log::debug!("spawned {placed} enemies in {zc}");
        Ok(placed)
    }

    /// Put a freshly made monster at `pos` and start its turns.
    pub fn spawn_enemy_at(&mut self, template: &str, pos: IVec2) -> Result<EntityId> {
        let e = self.make_enemy(template, pos)?;
        let id = self.level.insert(e);
        self.level.schedule(self.cfg.action_time_fast, Pending::ActorTurn(id));
        Ok(id)
    }

    /// Generate the zone at `coord` and store it with the visited zones.
    pub(crate) fn make_zone(&mut self, coord: IVec3, up_pos: Option<IVec2>) -> Result<()> {
        let layout = match coord.z {
            0 if coord == self.lab_zone => Layout::Lab,
            0 => Layout::Overworld,
            _ => Layout::Rooms,
        };
        let mut world = World::new(self.cfg.world_width, self.cfg.world_height);
        mapgen::generate(layout, &mut world, &mut self.rng, coord, up_pos, &self.field);
        let doors = world.doors.clone();
        let entry = world.entry;

        let mut lvl = Level::new(coord, world);
        lvl.is_lab = layout == Layout::Lab;
        self.levels.insert(coord, lvl);

        for pos in doors {
            let door = self.make_door(pos);
            self.insert_into(coord, door);
        }

        let npcs: Vec<(&'static str, IVec2)> = self
            .content
            .pois_at(coord)
            .flat_map(|p| p.npcs.iter().copied())
            .collect();
        for (npc, offset) in npcs {
            let Some(pos) = self.lvl(coord).and_then(|l| l.nearest_free(entry + offset, 12))
            else {
                log::warn!("no room for {npc} in {coord}");
                continue;
            };
            let e = self.make_npc(npc, pos)?;
            self.insert_into(coord, e);
        }

        if coord == self.start_zone && !self.academy_hint_shown {
            self.academy_hint_shown = true;
            if let Ok(academy) = self.content.poi("academy") {
                let c = academy.coord;
                msg!(self, "You hear of an Academy at ({}, {}).", c.x, c.y);
            }
        }

        if coord.z == 0 {
            let berries = self.content.berry_ids();
            for _ in 0..10 {
                let Some(pos) = self.random_free(coord) else { break };
                let Some(&berry) = berries.choose(&mut self.rng) else { break };
                let e = self.make_item(berry, pos)?;
                self.insert_into(coord, e);
            }

            let spot = self.lvl(coord).and_then(|l| {
                TRINKET_SPOTS
                    .iter()
                    .map(|&d| entry + d)
                    .find(|&p| l.world.is_walkable(p) && l.entity_at(p).is_none())
            });
            if let Some(pos) = spot {
                let e = self.make_item("destabilizer", pos)?;
                self.insert_into(coord, e);
            }
        }

        if layout == Layout::Lab {
            let console = ivec2(self.cfg.world_width / 2, self.cfg.world_height / 2);
            for (i, item) in LAB_ITEMS.iter().enumerate() {
                let want = console + ivec2(i as i32 - 3, 2);
                let Some(pos) = self.lvl(coord).and_then(|l| l.nearest_free(want, 3)) else {
                    continue;
                };
                let e = self.make_item(item, pos)?;
                self.insert_into(coord, e);
            }
        }

        log::info!("generated {layout:?} zone {coord}");
        Ok(())
    }

    /// Move the player's body into the zone at `dest`, generating it on the
    /// first visit.
    pub(crate) fn relocate(
        &mut self,
        dest: IVec3,
        up_pos: Option<IVec2>,
        arrival: Arrival,
    ) -> Result<()> {
        if dest == self.zone {
            let pos = arrival.resolve(&self.level);
            if let Some(e) = self.player_mut() {
                e.pos = pos;
            }
            self.level.need_fov = true;
            if let Some(aura) = self.lorenz.as_mut() {
                aura.reset(pos, dest);
            }
            return Ok(());
        }

        if self.lvl(dest).is_none() {
            self.make_zone(dest, up_pos)?;
            let n = self.cfg.enemies_per_zone;
            self.spawn_enemies(dest, n)?;
        }

        let Some(mut body) = self.level.remove(self.player) else {
            bail!("Player {} is not in zone {}", self.player, self.zone);
        };
        let Some(mut next) = self.levels.remove(&dest) else {
            self.level.insert(body);
            bail!("Zone {dest} went missing");
        };

        let pos = arrival.resolve(&next);
        body.pos = pos;
        next.insert(body);
        next.clear_pattern();
        next.need_fov = true;

        let mut prev = std::mem::replace(&mut self.level, next);
        prev.clear_pattern();
        self.levels.insert(prev.coord, prev);
        self.zone = dest;

        if let Some(s) = self.player_stats_mut() {
            s.coherence = s.max_coherence;
        }
        if let Some(aura) = self.lorenz.as_mut() {
            aura.reset(pos, dest);
        }
        log::info!("entered zone {dest} at {pos}");
        Ok(())
    }

    /// Walk off the edge of the zone into its neighbour.
    pub(crate) fn transition_edge(&mut self, dest_pos: IVec2) -> Result<()> {
        let (dz, wrapped) = self.level.world.wrap(dest_pos);
        let dest = self.zone + dz.extend(0);
        self.relocate(dest, None, Arrival::At(wrapped))?;
        msg!(self, "You travel to zone {},{} (depth {}).", dest.x, dest.y, dest.z);
        self.update_fov();
        if dest.z == 0 && self.rng.gen_bool(0.5) {
            self.trigger_event();
        }
        Ok(())
    }

    /// Take the down stairs under the player.
    pub fn descend(&mut self) -> Result<()> {
        let Some(pos) = self.player_pos() else {
            return Ok(());
        };
        if self.level.world.tile(pos).map(|t| t.glyph) != Some('>') {
            msg!(self, "There are no stairs down here.");
            return Ok(());
        }
        let dest = self.zone + ivec3(0, 0, 1);
        self.relocate(dest, Some(pos), Arrival::UpStairs)?;
        msg!(self, "You descend to depth {}.", dest.z);
        self.update_fov();
        Ok(())
    }

    /// Take the up stairs under the player. On the surface this asks for
    /// the world map instead.
    pub fn ascend(&mut self) -> Result<()> {
        let Some(pos) = self.player_pos() else {
            return Ok(());
        };
        let on_stairs = self.level.world.tile(pos).map(|t| t.glyph) == Some('<');
        if self.zone.z > 0 && on_stairs {
            let dest = self.zone - ivec3(0, 0, 1);
            self.relocate(dest, None, Arrival::DownStairs)?;
            msg!(self, "You ascend to depth {}.", dest.z);
            self.update_fov();
        } else if self.zone.z == 0 {
            self.map_requested = true;
        } else {
            msg!(self, "There are no stairs up here.");
        }
        Ok(())
    }

    /// Jump to the entry of an overworld zone picked from the world map.
    pub fn fast_travel(&mut self, x: i32, y: i32) -> Result<()> {
        let span = self.cfg.world_map_screens.max(1);
        let dest = ivec3(x.clamp(0, span - 1), y.clamp(0, span - 1), 0);
        self.relocate(dest, None, Arrival::Entry)?;
        msg!(self, "You fast-travel to zone {},{}.", dest.x, dest.y);
        self.update_fov();
        Ok(())
    }

    /// Move the player's mind into another living actor of the zone.
    pub fn possess(&mut self, target: EntityId) {
        if target == self.player {
            return;
        }
        if !self.level.entity(target).is_some_and(|e| e.is_alive()) {
            msg!(self, "Your consciousness finds no purchase.");
            return;
        }

        let old = self.player;
        if let Some(a) = self.level.entity_mut(old).and_then(|e| e.actor_mut()) {
            a.is_player = false;
            a.faction = a.native_faction.unwrap_or(Faction::Hostile);
        }
        if self.level.contains(old) && !self.has_turn_pending(self.zone, old) {
            self.level.schedule(self.cfg.action_time_fast, Pending::ActorTurn(old));
        }

        let Some(e) = self.level.entity_mut(target) else {
            return;
        };
        let pos = e.pos;
        let fallback = e.name.to_lowercase();
        let Some(a) = e.actor_mut() else {
            return;
        };
        if a.native_faction.is_none() {
            a.native_faction = Some(a.faction);
        }
        a.is_player = true;
        a.faction = Faction::Player;
        let label = a
            .species
            .as_deref()
            .map(|s| s.replace('_', " "))
            .unwrap_or(fallback);

        log::info!("player moves from {old} to {target}");
        self.player = target;
        self.host_label = label.clone();
        self.level.need_fov = true;
        self.update_fov();
        if let Some(aura) = self.lorenz.as_mut() {
            aura.reset(pos, self.zone);
        }
        msg!(
            self,
            "You've always been {} {label}, so long as you can remember.",
            crate::a_or_an(&label)
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{game::test::*, Action, ActionRegistry, Character, Config, PlayerClass};

    fn count_player(g: &Game) -> usize {
        let pid = g.player_id();
        let here = g.level.actor_ids().iter().filter(|&&id| id == pid).count();
        let elsewhere: usize = g
            .levels
            .values()
            .map(|l| l.actor_ids().iter().filter(|&&id| id == pid).count())
            .sum();
        here + elsewhere
    }

    #[test]
    fn edge_walk_moves_body() {
        let mut g = game(20);
        clear_zone(&mut g);
        let start = g.zone();
        let y = 5;
        g.player_mut().unwrap().pos = ivec2(g.cfg.world_width - 1, y);

        g.queue_player_action(Action::Move(ivec2(1, 0))).unwrap();
        assert_eq!(g.zone(), start + ivec3(1, 0, 0));
        assert_eq!(count_player(&g), 1);
        assert!(g.level.contains(g.player_id()));
        assert!(!g.levels[&start].contains(g.player_id()));
        assert!(g.log.mentions(&format!("You travel to zone {},{} (depth 0).", start.x + 1, start.y)));
        let p = g.player_pos().unwrap();
        assert!(g.level.world.is_walkable(p));
        assert!(!g.levels.contains_key(&g.zone()));
    }

    #[test]
    fn stairs_round_trip() {
        let mut g = game(21);
        let down = g.level.world.down_stairs.unwrap();
        g.player_mut().unwrap().pos = down;
        g.descend().unwrap();
        assert_eq!(g.zone().z, 1);
        assert!(g.log.mentions("You descend to depth 1."));
        assert_eq!(g.level.world.up_stairs, Some(down));
        assert_eq!(g.player_pos(), Some(down));
        assert_eq!(count_player(&g), 1);

        g.ascend().unwrap();
        assert_eq!(g.zone().z, 0);
        assert_eq!(g.player_pos(), Some(down));
        assert_eq!(count_player(&g), 1);

        g.ascend().unwrap();
        assert!(g.map_requested);
    }

    #[test]
    fn fast_travel_clamps() {
        let mut g = game(22);
        g.fast_travel(-5, 99).unwrap();
        let span = g.cfg.world_map_screens;
        assert_eq!(g.zone(), ivec3(0, span - 1, 0));
        assert!(g.log.mentions(&format!("You fast-travel to zone 0,{}.", span - 1)));
        assert_eq!(count_player(&g), 1);
    }

    #[test]
    fn lorenz_resets_on_zone_change() {
        let character = Character {
            class: PlayerClass::StrangeAttractor,
            seed: Some(23),
            ..Character::default()
        };
        let mut g = Game::new(Config::default(), character, ActionRegistry::standard()).unwrap();
        g.queue_player_action(Action::Wait).unwrap();
        assert!(!g.lorenz().unwrap().points.is_empty());
        g.fast_travel(0, 0).unwrap();
        let aura = g.lorenz().unwrap();
        assert!(aura.points.is_empty());
        assert!(aura.reset_trails);
        assert_eq!(aura.center, g.player_pos().map(|p| p.as_dvec2()));
    }

    #[test]
    fn possession_swaps_host() {
        let mut g = game(24);
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();
        let old = g.player_id();
        let bat = g.spawn_enemy_at("vampire_bat", pos + ivec2(2, 0)).unwrap();

        g.possess(bat);
        assert_eq!(g.player_id(), bat);
        assert_eq!(g.host_label(), "vampire bat");
        assert!(g.log.mentions("You've always been a vampire bat"));
        let host = g.player().unwrap().actor().unwrap();
        assert!(host.is_player);
        assert_eq!(host.faction, Faction::Player);
        assert_eq!(host.native_faction, Some(Faction::Hostile));

        let prev = g.level.entity(old).unwrap().actor().unwrap();
        assert!(!prev.is_player);
        assert_eq!(prev.faction, Faction::Hostile);

        g.possess(old);
        // The first faction stays remembered.
        let bat = g.level.entity(bat).unwrap().actor().unwrap();
        assert_eq!(bat.native_faction, Some(Faction::Hostile));
        assert_eq!(bat.faction, Faction::Hostile);

        g.possess(EntityId(9999));
        assert_eq!(g.log.last(), Some("Your consciousness finds no purchase."));
    }

    #[test]
    fn surface_zones_get_trinkets() {
        let mut g = game(25);
        let coord = g.zone() + ivec3(0, 1, 0);
        g.make_zone(coord, None).unwrap();
        let lvl = &g.levels[&coord];
        let entry = lvl.world.entry;
        let stab = lvl
            .entities()
            .find(|e| e.template.as_deref() == Some("destabilizer"))
            .unwrap();
        assert!((stab.pos - entry).taxi_len() <= 2);
        assert!(lvl.entities().filter(|e| e.item().is_some()).count() > 1);
    }
}
