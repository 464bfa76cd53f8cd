//! Simulation core: zones, scheduling, runes and everything that acts in them.

mod action;
pub use action::{
    all_action_kinds, Action, ActionDef, ActionKind, ActionRegistry, Speed,
    TargetMode, Targeting,
};

mod activation;
pub use activation::{coverage, fizzle_roll, HALF_DIAGONAL};

mod ai;
pub use ai::{Ai, Brain, StandardAi};

mod character;
pub use character::{Attributes, Character, Illuminator, PlayerClass, Stat};

mod color;
pub use color::Rgb;

mod combat;

mod config;
pub use config::Config;

mod content;
pub use content::{Content, EnemyTemplate, EntityTemplate, NpcDef, Poi};

mod effects;

mod entity;
pub use entity::{
    Actor, Entity, EntityId, EntityKind, Faction, Feature, Item, ItemKind,
    Slow, Stats, Status,
};

mod events;
pub use events::OverworldEvent;

mod fov;

mod game;
pub use game::{Game, Urgent};
pub(crate) use game::UrgentEffect;

mod generator;
pub use generator::{cleanup_duplicates, Generator};

mod inventory;

mod level;
pub use level::{Dot, DotKind, Level, Motion, Pending};

mod lorenz;
pub use lorenz::LorenzAura;

mod mapgen;
pub use mapgen::{FractalField, Layout};

mod msg;
pub use msg::{a_or_an, MessageLog, LOG_CAPACITY};

mod params;
pub use params::{param_defs, ParamDef, ParamValue, Params};

mod pattern;
pub use pattern::{tile_of, Edge, Pattern, Segment, Vertex};

pub mod prelude;

mod rune;

mod scheduler;
pub use scheduler::Scheduler;

mod tile;
pub use tile::Tile;

mod time;
pub use time::Instant;

mod world;
pub use world::World;

mod world_map;
pub use world_map::{Overview, WorldMap};

mod zone;

pub type Result<T> = anyhow::Result<T>;
