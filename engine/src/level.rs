//! Per-zone state: map, entities, event queue and the held rune.

use std::collections::BTreeMap;

use glam::DVec2;
use util::{dijkstra_map, within_range};

use crate::{prelude::*, Entity, EntityId, Instant, Pattern, Scheduler, World};

/// Scheduled work of a zone, resumed by dispatching on the kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Pending {
    /// A non-player actor gets to act.
    ActorTurn(EntityId),
    /// Finish laying down a pattern after the placement delay.
    PlaceTerminus { anchor: IVec2, terminus: IVec2 },
    /// One tick of a pattern-shaped damage or healing field.
    Dot(Dot),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DotKind {
    /// Burns by edge redness.
    Ignite,
    /// Heals by edge greenness.
    Regrow,
}

/// State of a running ignite or regrow effect.
#[derive(Clone, Debug, PartialEq)]
pub struct Dot {
    pub kind: DotKind,
    pub remaining: i64,
    pub duration: i64,
    /// Fractional amounts owed to each target, carried between ticks.
    pub acc: BTreeMap<EntityId, f64>,
}

impl Dot {
    pub fn new(kind: DotKind, duration: i64) -> Self {
        Dot {
            kind,
            remaining: duration,
            duration,
            acc: Default::default(),
        }
    }

    /// Add `amount` to a target's account and take out the whole part.
    pub fn accrue(&mut self, id: EntityId, amount: f64) -> i64 {
        let acc = self.acc.entry(id).or_insert(0.0);
        *acc += amount;
        // Epsilon so that 0.4 * 5 adds up to a full 2.
        let whole = (*acc + 1e-9).floor();
        *acc -= whole;
        whole as i64
    }
}

/// A pattern drifting across the zone.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Motion {
    /// Translation per step, in tiles.
    pub delta: DVec2,
    /// Rotation per step around the pattern's center of mass, in degrees.
    pub rotation: f64,
    /// Ticks accumulated towards the next step.
    pub accum: i64,
}

pub struct Level {
    pub coord: IVec3,
    pub world: World,
    /// Every entity of the zone, actors included, in spawn order.
    entities: IndexMap<EntityId, Entity>,
    /// Ids of the entities that are actors.
    actors: IndexSet<EntityId>,
    pub(crate) events: Scheduler<Pending>,

    pub pattern: Pattern,
    pub anchor: Option<IVec2>,
    /// World positions hit by the latest activation, for display.
    pub activation_points: Vec<DVec2>,
    pub activation_ttl: i64,
    pub awaiting_terminus: bool,
    pub need_fov: bool,
    /// Actors already announced in the log.
    pub spotted: HashSet<EntityId>,
    pub(crate) motion: Option<Motion>,
    pub is_lab: bool,
}

impl Level {
    pub fn new(coord: IVec3, world: World) -> Self {
        Level {
            coord,
            world,
            entities: Default::default(),
            actors: Default::default(),
            events: Default::default(),
            pattern: Default::default(),
            anchor: None,
            activation_points: Vec::new(),
            activation_ttl: 0,
            awaiting_terminus: false,
            need_fov: true,
            spotted: Default::default(),
            motion: None,
            is_lab: false,
        }
    }

    pub fn now(&self) -> Instant {
        self.events.now()
    }

    pub fn depth(&self) -> i32 {
        self.coord.z
    }

    /// Add an entity, indexing it as an actor if it is one.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if entity.is_actor() {
            self.actors.insert(id);
        }
        self.entities.insert(id, entity);
        id
    }

    /// Take an entity out of the zone.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.actors.shift_remove(&id);
        self.entities.shift_remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Entity> {
        self.actors.iter().filter_map(|id| self.entities.get(id))
    }

    /// Snapshot of the actor ids, for loops that mutate the zone.
    pub fn actor_ids(&self) -> Vec<EntityId> {
        self.actors.iter().copied().collect()
    }

    /// Living actor standing at `pos`.
    pub fn actor_at(&self, pos: IVec2) -> Option<EntityId> {
        self.actors()
            .find(|e| e.pos == pos && e.is_alive())
            .map(|e| e.id)
    }

    /// Topmost thing at `pos`, items and features before actors.
    pub fn entity_at(&self, pos: IVec2) -> Option<&Entity> {
        let mut here = self.entities().filter(|e| e.pos == pos);
        let first = here.next()?;
        if !first.is_actor() {
            return Some(first);
        }
        Some(here.find(|e| !e.is_actor()).unwrap_or(first))
    }

    /// Non-actor entity blocking movement at `pos`.
    pub fn blocker_at(&self, pos: IVec2) -> Option<EntityId> {
        self.entities()
            .find(|e| e.pos == pos && e.blocks_movement && !e.is_actor())
            .map(|e| e.id)
    }

    pub fn items_at(&self, pos: IVec2) -> Vec<EntityId> {
        self.entities()
            .filter(|e| e.pos == pos && e.item().is_some())
            .map(|e| e.id)
            .collect()
    }

    pub fn blocks_sight(&self, pos: IVec2) -> bool {
        !self.world.is_walkable(pos)
            || self.entities().any(|e| e.pos == pos && e.is_closed_door())
    }

    /// Walkable with nothing standing in the way.
    pub fn is_free(&self, pos: IVec2) -> bool {
        self.world.is_walkable(pos)
            && self.actor_at(pos).is_none()
            && self.blocker_at(pos).is_none()
    }

    /// Closest free tile to `origin`, searching out to `radius` steps.
    pub fn nearest_free(&self, origin: IVec2, radius: usize) -> Option<IVec2> {
        let world = &self.world;
        dijkstra_map(
            |&p: &IVec2| {
                DIR_8
                    .iter()
                    .map(move |&d| p + d)
                    .filter(|&q| world.in_bounds(q))
                    .collect::<Vec<_>>()
            },
            [origin],
        )
        .take_while(within_range(radius + 1))
        .map(|(p, _)| p)
        .find(|&p| self.is_free(p))
    }

    pub fn schedule(&mut self, delay: i64, item: Pending) {
        log::trace!("{:?} at {}: schedule {item:?} in {delay}", self.coord, self.now());
        self.events.schedule(delay, item);
    }

    /// Drop the held rune and everything hanging off it.
    pub fn clear_pattern(&mut self) {
        self.pattern = Pattern::default();
        self.anchor = None;
        self.activation_points.clear();
        self.activation_ttl = 0;
        self.awaiting_terminus = false;
        self.motion = None;
    }

    /// World positions of the pattern's vertices, empty without an anchor.
    pub fn projected_vertices(&self) -> Vec<DVec2> {
        match self.anchor {
            Some(anchor) => self.pattern.world_positions(anchor).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::{Actor, EntityKind, Faction, Item, ItemKind, Stats, Tile};

    fn level() -> Level {
        let mut world = World::new(10, 10);
        world.fill(Tile::FLOOR);
        Level::new(IVec3::ZERO, world)
    }

    fn imp(id: u32, pos: IVec2) -> Entity {
        let stats = Stats {
            hp: 3,
            max_hp: 3,
            ..Default::default()
        };
        Entity {
            pos,
            ..Entity::new(
                EntityId(id),
                "Imp",
                EntityKind::Actor(Actor::new(Faction::Hostile, stats)),
            )
        }
    }

    fn berry(id: u32, pos: IVec2) -> Entity {
        Entity {
            pos,
            ..Entity::new(
                EntityId(id),
                "Strawberry",
                EntityKind::Item(Item {
                    kind: ItemKind::Berry,
                    grants_ability: None,
                    amount: 1,
                }),
            )
        }
    }

    #[test]
    fn actors_mirror_entities() {
        let mut lev = level();
        lev.insert(imp(1, ivec2(2, 2)));
        lev.insert(berry(2, ivec2(2, 2)));
        assert_eq!(lev.actor_ids(), vec![EntityId(1)]);
        assert_eq!(lev.entities().count(), 2);

        // Items win over actors on the same tile.
        assert_eq!(lev.entity_at(ivec2(2, 2)).map(|e| e.id), Some(EntityId(2)));
        assert_eq!(lev.actor_at(ivec2(2, 2)), Some(EntityId(1)));
        assert!(!lev.is_free(ivec2(2, 2)));

        assert!(lev.remove(EntityId(1)).is_some());
        assert!(lev.actor_ids().is_empty());
        assert!(!lev.contains(EntityId(1)));
        assert!(lev.remove(EntityId(1)).is_none());
        assert_eq!(lev.entity_at(ivec2(2, 2)).map(|e| e.id), Some(EntityId(2)));
    }

    #[test]
    fn free_tile_search() {
        let mut lev = level();
        lev.insert(imp(1, ivec2(5, 5)));
        let p = lev.nearest_free(ivec2(5, 5), 3).unwrap();
        assert!((p - ivec2(5, 5)).is_adjacent());
        assert_eq!(lev.nearest_free(ivec2(0, 0), 0), Some(ivec2(0, 0)));
    }

    #[test]
    fn fractional_damage_carries() {
        let mut dot = Dot::new(DotKind::Ignite, 30);
        let id = EntityId(7);
        let total: i64 = (0..5).map(|_| dot.accrue(id, 0.4)).sum();
        assert_eq!(total, 2);
    }

    #[quickcheck]
    fn accrual_never_loses_remainders(steps: Vec<u8>) -> bool {
        let mut dot = Dot::new(DotKind::Regrow, 30);
        let id = EntityId(1);
        let mut paid = 0;
        let mut owed = 0.0;
        for s in steps {
            let x = s as f64 / 100.0;
            owed += x;
            paid += dot.accrue(id, x);
        }
        (owed - paid as f64 - dot.acc.get(&id).copied().unwrap_or(0.0)).abs()
            < 1e-6
    }
}
