//! Player and monster verbs and the registry describing their costs.

use anyhow::anyhow;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{prelude::*, Config, Result};

/// Name of an ability, the key of the action registry.
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
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Wait,
    Look,
    Yawp,
    ImpTaunt,
    Place,
    Subdivide,
    Extend,
    Koch,
    Branch,
    Zigzag,
    Custom,
    Destabilize,
    Rainbow,
    Verdant,
    PushPattern,
    ActivateAll,
    ActivateSeed,
    Reset,
    Meditate,
    Ignite,
    Regrow,
    Freeze,
}

impl ActionKind {
    /// Parse an action name. `custom_N` names the Nth saved custom pattern.
    pub fn parse(name: &str) -> Option<(ActionKind, usize)> {
        if let Some(n) = name.strip_prefix("custom_") {
            return n.parse().ok().map(|n| (ActionKind::Custom, n));
        }
        name.parse().ok().map(|k| (k, 0))
    }

    /// Core verbs every body can perform without learning them.
    pub fn is_innate(self) -> bool {
        matches!(self, ActionKind::Move | ActionKind::Wait | ActionKind::Look)
    }

    pub fn is_fractal_op(self) -> bool {
        use ActionKind::*;
        matches!(self, Subdivide | Extend | Koch | Branch | Zigzag | Custom)
    }
}

/// An action with its parameters, ready to execute.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Step or bump towards an adjacent tile.
    Move(IVec2),
    Wait,
    /// Describe what is at a tile.
    Look(IVec2),
    Yawp,
    ImpTaunt,
    /// Start choosing a terminus for a new pattern.
    Place,
    Subdivide,
    Extend,
    Koch,
    Branch,
    Zigzag,
    /// Replay the saved custom pattern in the given slot.
    Custom(usize),
    Destabilize,
    Rainbow,
    Verdant,
    /// Start the pattern drifting towards a world point while turning.
    PushPattern { target: DVec2, rotation: f64 },
    /// Burst the vertices around the given target vertex.
    ActivateAll { target: Option<usize> },
    /// Light up the given vertex and its neighbours.
    ActivateSeed { target: Option<usize> },
    Reset,
    Meditate,
    Ignite,
    Regrow,
    Freeze,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        use Action::*;
        match self {
            Move(_) => ActionKind::Move,
            Wait => ActionKind::Wait,
            Look(_) => ActionKind::Look,
            Yawp => ActionKind::Yawp,
            ImpTaunt => ActionKind::ImpTaunt,
            Place => ActionKind::Place,
            Subdivide => ActionKind::Subdivide,
            Extend => ActionKind::Extend,
            Koch => ActionKind::Koch,
            Branch => ActionKind::Branch,
            Zigzag => ActionKind::Zigzag,
            Custom(_) => ActionKind::Custom,
            Destabilize => ActionKind::Destabilize,
            Rainbow => ActionKind::Rainbow,
            Verdant => ActionKind::Verdant,
            PushPattern { .. } => ActionKind::PushPattern,
            ActivateAll { .. } => ActionKind::ActivateAll,
            ActivateSeed { .. } => ActionKind::ActivateSeed,
            Reset => ActionKind::Reset,
            Meditate => ActionKind::Meditate,
            Ignite => ActionKind::Ignite,
            Regrow => ActionKind::Regrow,
            Freeze => ActionKind::Freeze,
        }
    }

    /// Action for a kind that needs no further parameters.
    ///
    /// Targeted actions start without a target, movement and looking need
    /// explicit parameters and give `None`.
    pub fn bare(kind: ActionKind, slot: usize) -> Option<Action> {
        use ActionKind::*;
        Some(match kind {
            Move | Look | PushPattern => return None,
            Wait => Action::Wait,
            Yawp => Action::Yawp,
            ImpTaunt => Action::ImpTaunt,
            Place => Action::Place,
            Subdivide => Action::Subdivide,
            Extend => Action::Extend,
            Koch => Action::Koch,
            Branch => Action::Branch,
            Zigzag => Action::Zigzag,
            Custom => Action::Custom(slot),
            Destabilize => Action::Destabilize,
            Rainbow => Action::Rainbow,
            Verdant => Action::Verdant,
            ActivateAll => Action::ActivateAll { target: None },
            ActivateSeed => Action::ActivateSeed { target: None },
            Reset => Action::Reset,
            Meditate => Action::Meditate,
            Ignite => Action::Ignite,
            Regrow => Action::Regrow,
            Freeze => Action::Freeze,
        })
    }
}

/// Time cost class of an action.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Speed {
    Instant,
    Fast,
    Slow,
}

impl Speed {
    pub fn ticks(self, cfg: &Config) -> i64 {
        match self {
            Speed::Instant => cfg.action_time_instant,
            Speed::Fast => cfg.action_time_fast,
            Speed::Slow => cfg.action_time_slow,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TargetMode {
    Tile,
    Vertex,
    Position,
    Look,
}

/// What the presentation layer should ask for before sending an action.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Targeting {
    pub mode: TargetMode,
    pub range: Option<f64>,
    /// Parameter giving the area radius, as (owner, key).
    pub radius_param: Option<(&'static str, &'static str)>,
    /// Parameter giving the graph neighbour depth, as (owner, key).
    pub depth_param: Option<(&'static str, &'static str)>,
}

impl Targeting {
    pub fn new(mode: TargetMode) -> Self {
        Targeting {
            mode,
            range: None,
            radius_param: None,
            depth_param: None,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ActionDef {
    pub label: &'static str,
    pub speed: Speed,
    pub cooldown: i64,
    pub show_in_bar: bool,
    pub targeting: Option<Targeting>,
}

impl ActionDef {
    pub fn new(label: &'static str, speed: Speed) -> Self {
        ActionDef {
            label,
            speed,
            cooldown: 0,
            show_in_bar: true,
            targeting: None,
        }
    }

    pub fn cooldown(mut self, ticks: i64) -> Self {
        self.cooldown = ticks;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show_in_bar = false;
        self
    }

    pub fn targeting(mut self, t: Targeting) -> Self {
        self.targeting = Some(t);
        self
    }
}

/// Table of action definitions, built once and handed to the engine.
#[derive(Clone, Debug, Default)]
pub struct ActionRegistry {
    defs: IndexMap<ActionKind, ActionDef>,
}

impl ActionRegistry {
    /// The full set of actions of the game.
    pub fn standard() -> Self {
        use ActionKind::*;
        use Speed::*;

        let vertex = Targeting::new(TargetMode::Vertex);

        ActionRegistry::default()
            .with(Move, ActionDef::new("Move", Fast).hidden())
            .with(Wait, ActionDef::new("Wait", Fast).hidden())
            .with(
                Look,
                ActionDef::new("Look", Instant)
                    .hidden()
                    .targeting(Targeting::new(TargetMode::Look)),
            )
            .with(Yawp, ActionDef::new("Yawp", Fast).hidden())
            .with(ImpTaunt, ActionDef::new("Taunt", Fast).hidden())
            .with(
                Place,
                ActionDef::new("Place", Instant).targeting(Targeting {
                    range: Some(Config::default().place_range),
                    ..Targeting::new(TargetMode::Tile)
                }),
            )
            .with(Subdivide, ActionDef::new("Subdivide", Fast))
            .with(Extend, ActionDef::new("Extend", Fast))
            .with(Koch, ActionDef::new("Koch", Fast))
            .with(Branch, ActionDef::new("Branch", Fast))
            .with(Zigzag, ActionDef::new("Zigzag", Fast))
            .with(Custom, ActionDef::new("Custom", Fast))
            .with(Destabilize, ActionDef::new("Destabilize", Fast).cooldown(15))
            .with(Rainbow, ActionDef::new("Rainbow", Fast))
            .with(Verdant, ActionDef::new("Verdant", Fast))
            .with(
                PushPattern,
                ActionDef::new("Push", Fast)
                    .targeting(Targeting::new(TargetMode::Position)),
            )
            .with(
                ActivateAll,
                ActionDef::new("Activate", Fast).targeting(Targeting {
                    radius_param: Some(("activate_all", "radius")),
                    ..vertex
                }),
            )
            .with(
                ActivateSeed,
                ActionDef::new("Activate", Fast).targeting(Targeting {
                    depth_param: Some(("activate_seed", "neighbor_depth")),
                    ..vertex
                }),
            )
            .with(Reset, ActionDef::new("Reset", Instant))
            .with(Meditate, ActionDef::new("Meditate", Slow))
            .with(Ignite, ActionDef::new("Ignite", Fast).cooldown(30))
            .with(Regrow, ActionDef::new("Regrow", Fast).cooldown(30))
            .with(Freeze, ActionDef::new("Freeze", Fast).cooldown(20))
    }

    /// Add or replace a definition.
    pub fn with(mut self, kind: ActionKind, def: ActionDef) -> Self {
        self.defs.insert(kind, def);
        self
    }

    pub fn def(&self, kind: ActionKind) -> Result<&ActionDef> {
        self.defs
            .get(&kind)
            .ok_or_else(|| self.unknown(&kind.to_string()))
    }

    /// Look up a definition by its name.
    pub fn get(&self, name: &str) -> Result<&ActionDef> {
        match ActionKind::parse(name) {
            Some((kind, _)) => self.def(kind),
            None => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> anyhow::Error {
        let known: Vec<String> = self.names().collect();
        anyhow!("Unknown action '{name}'. Known actions: {}", known.join(", "))
    }

    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.defs.keys().map(|k| k.to_string())
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.defs.contains_key(&kind)
    }

    /// Ticks an action costs before slowdowns.
    pub fn delay(&self, kind: ActionKind, cfg: &Config) -> Result<i64> {
        Ok(self.def(kind)?.speed.ticks(cfg))
    }

    /// Actions of a kit that go in the ability bar, in kit order.
    pub fn bar<'a>(
        &'a self,
        kit: &'a [ActionKind],
    ) -> impl Iterator<Item = (ActionKind, &'a ActionDef)> + 'a {
        kit.iter().filter_map(|&k| {
            self.defs.get(&k).filter(|d| d.show_in_bar).map(|d| (k, d))
        })
    }
}

/// Every action kind the engine knows how to execute.
pub fn all_action_kinds() -> impl Iterator<Item = ActionKind> {
    ActionKind::iter()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_parse() {
        assert_eq!(ActionKind::parse("activate_all"), Some((ActionKind::ActivateAll, 0)));
        assert_eq!(ActionKind::parse("custom_3"), Some((ActionKind::Custom, 3)));
        assert_eq!(ActionKind::parse("custom_x"), None);
        assert_eq!(ActionKind::parse("fireball"), None);
        assert_eq!(ActionKind::PushPattern.to_string(), "push_pattern");
    }

    #[test]
    fn standard_registry_is_complete() {
        let reg = ActionRegistry::standard();
        for kind in all_action_kinds() {
            assert!(reg.contains(kind), "missing {kind}");
        }
        let cfg = Config::default();
        assert_eq!(reg.delay(ActionKind::Meditate, &cfg).unwrap(), 20);
        assert_eq!(reg.delay(ActionKind::Move, &cfg).unwrap(), 10);
        assert_eq!(reg.delay(ActionKind::Reset, &cfg).unwrap(), 0);
        assert_eq!(reg.get("destabilize").unwrap().cooldown, 15);
        assert!(reg.get("custom_2").is_ok());
    }

    #[test]
    fn unknown_names_list_known_ones() {
        let reg = ActionRegistry::default()
            .with(ActionKind::Wait, ActionDef::new("Wait", Speed::Fast));
        let err = reg.get("fireball").unwrap_err().to_string();
        assert!(err.contains("fireball"));
        assert!(err.contains("wait"));
        assert!(reg.def(ActionKind::Move).is_err());
    }

    #[test]
    fn bar_follows_kit_order() {
        let reg = ActionRegistry::standard();
        let kit = [ActionKind::Move, ActionKind::Reset, ActionKind::Place];
        let bar: Vec<ActionKind> = reg.bar(&kit).map(|(k, _)| k).collect();
        assert_eq!(bar, vec![ActionKind::Reset, ActionKind::Place]);
    }
}
