//! Things placed in a zone: actors, items and map features.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{prelude::*, ActionKind, Brain, Rgb};

/// Unique handle of an entity, never reused within a run.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
pub struct EntityId(pub(crate) u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Player,
    Hostile,
    Npc,
    Neutral,
}

impl Faction {
    /// Whether members of this faction attack members of the other.
    pub fn opposes(self, other: Faction) -> bool {
        use Faction::*;
        match (self, other) {
            (Hostile, Hostile) => false,
            (Hostile, _) | (_, Hostile) => true,
            _ => false,
        }
    }
}

/// Timed conditions tracked in remaining turns or ticks.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    /// Turns during which the actor might fumble its turn.
    Distracted,
    /// Favour of the vagrant.
    Blessed,
    Cursed,
}

#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Stats {
    pub hp: i64,
    pub max_hp: i64,
    pub mana: i64,
    pub max_mana: i64,
    pub xp: i64,
    pub level: i64,
    pub xp_to_next: i64,
    pub coherence: i64,
    pub max_coherence: i64,
}

impl Stats {
    pub fn alive(&self) -> bool {
        self.hp > 0
    }

    /// Apply damage, returning the amount actually lost.
    pub fn hurt(&mut self, amount: i64) -> i64 {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0)).clamp(0, self.max_hp);
        before - self.hp
    }

    /// Apply healing, returning the amount actually gained.
    pub fn heal(&mut self, amount: i64) -> i64 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).clamp(0, self.max_hp);
        self.hp - before
    }

    /// Add mana, returning the amount actually gained.
    pub fn restore_mana(&mut self, amount: i64) -> i64 {
        let before = self.mana;
        self.mana = (self.mana + amount.max(0)).clamp(0, self.max_mana);
        self.mana - before
    }

    pub fn clamp(&mut self) {
        self.hp = self.hp.clamp(0, self.max_hp);
        self.mana = self.mana.clamp(0, self.max_mana);
        self.coherence = self.coherence.clamp(0, self.max_coherence);
    }
}

/// Multiplicative slowdown from freezing.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Slow {
    pub factor: f64,
    /// Ticks accumulated towards the next decay step.
    pub timer: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub faction: Faction,
    pub stats: Stats,
    /// Ordered ability list, drives the ability bar and gates actions.
    pub actions: Vec<ActionKind>,
    pub brain: Brain,
    pub species: Option<String>,
    /// Conversation definition for talkative NPCs.
    pub npc: Option<String>,
    pub is_player: bool,
    /// Faction from before the player took over this body.
    pub native_faction: Option<Faction>,
    /// Experience worth, falls back to the configured default.
    pub xp_value: Option<i64>,
    pub xp_awarded: bool,
    pub slow: Option<Slow>,
}

impl Actor {
    pub fn new(faction: Faction, stats: Stats) -> Self {
        Actor {
            faction,
            stats,
            actions: vec![ActionKind::Move, ActionKind::Wait],
            brain: Brain::default(),
            species: None,
            npc: None,
            is_player: false,
            native_faction: None,
            xp_value: None,
            xp_awarded: false,
            slow: None,
        }
    }

    pub fn slow_factor(&self) -> f64 {
        self.slow.map_or(1.0, |s| s.factor)
    }
}

#[derive(
    Copy, Clone, Eq, PartialEq, Debug, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Berry,
    Trinket,
    Currency,
    /// Holds its own inventory.
    Container,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub grants_ability: Option<ActionKind>,
    /// Stack size, coin count for currency.
    pub amount: i64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Feature {
    Door { open: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Actor(Actor),
    Item(Item),
    Feature(Feature),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub pos: IVec2,
    pub glyph: char,
    pub color: Rgb,
    pub blocks_movement: bool,
    pub kind: EntityKind,
    /// Template the entity was spawned from.
    pub template: Option<String>,
    /// Free-form presentation hints like adjectives or visual effects.
    pub tags: BTreeMap<String, String>,
    pub statuses: BTreeMap<Status, i64>,
    /// Remaining recharge ticks per ability.
    pub cooldowns: BTreeMap<ActionKind, i64>,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>, kind: EntityKind) -> Self {
        let blocks_movement = match &kind {
            EntityKind::Actor(_) => true,
            EntityKind::Item(_) => false,
            EntityKind::Feature(Feature::Door { open }) => !open,
        };
        Entity {
            id,
            name: name.into(),
            pos: IVec2::ZERO,
            glyph: '?',
            color: Rgb::WHITE,
            blocks_movement,
            kind,
            template: None,
            tags: Default::default(),
            statuses: Default::default(),
            cooldowns: Default::default(),
        }
    }

    pub fn actor(&self) -> Option<&Actor> {
        match &self.kind {
            EntityKind::Actor(a) => Some(a),
            _ => None,
        }
    }

    pub fn actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.kind {
            EntityKind::Actor(a) => Some(a),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match &self.kind {
            EntityKind::Item(i) => Some(i),
            _ => None,
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(self.kind, EntityKind::Actor(_))
    }

    pub fn is_alive(&self) -> bool {
        self.actor().is_some_and(|a| a.stats.alive())
    }

    pub fn faction(&self) -> Option<Faction> {
        self.actor().map(|a| a.faction)
    }

    pub fn is_closed_door(&self) -> bool {
        matches!(self.kind, EntityKind::Feature(Feature::Door { open: false }))
    }

    /// Open a closed door. Returns whether anything changed.
    pub fn open_door(&mut self) -> bool {
        if let EntityKind::Feature(Feature::Door { open }) = &mut self.kind {
            if !*open {
                *open = true;
                self.blocks_movement = false;
                self.glyph = '\'';
                return true;
            }
        }
        false
    }

    /// Lower-case name with an indefinite article.
    pub fn a_name(&self) -> String {
        let name = self.name.to_lowercase();
        format!("{} {name}", crate::a_or_an(&name))
    }

    /// Count down a status, dropping it once it runs out.
    pub fn tick_status(&mut self, status: Status) {
        if let Some(n) = self.statuses.get_mut(&status) {
            *n -= 1;
            if *n <= 0 {
                self.statuses.remove(&status);
            }
        }
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.statuses.get(&status).is_some_and(|&n| n > 0)
    }

    pub fn cooldown(&self, kind: ActionKind) -> i64 {
        self.cooldowns.get(&kind).copied().unwrap_or(0)
    }

    /// Reduce every cooldown by `delta`, dropping finished ones.
    pub fn tick_cooldowns(&mut self, delta: i64) {
        self.cooldowns.retain(|_, n| {
            *n -= delta;
            *n > 0
        });
    }
}
