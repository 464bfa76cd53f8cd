//! Character sheet: attributes, class and rune-crafting loadout.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{ActionKind, Pattern, Stats};

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
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Con,
    Agi,
    Int,
    Res,
}

#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Attributes {
    pub con: i32,
    pub agi: i32,
    pub int: i32,
    pub res: i32,
}

impl Attributes {
    pub fn new(con: i32, agi: i32, int: i32, res: i32) -> Self {
        Attributes { con, agi, int, res }
    }

    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Con => self.con,
            Stat::Agi => self.agi,
            Stat::Int => self.int,
            Stat::Res => self.res,
        }
    }

    pub fn bump(&mut self, stat: Stat) {
        match stat {
            Stat::Con => self.con += 1,
            Stat::Agi => self.agi += 1,
            Stat::Int => self.int += 1,
            Stat::Res => self.res += 1,
        }
    }
}

#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum PlayerClass {
    #[default]
    Kochbender,
    #[strum(to_string = "Strange Attractor", serialize = "attractor")]
    StrangeAttractor,
}

impl PlayerClass {
    /// Relative odds of each stat growing on an automatic level-up roll.
    pub fn stat_weights(self) -> [(Stat, f64); 4] {
        match self {
            PlayerClass::Kochbender => [
                (Stat::Con, 0.2),
                (Stat::Res, 0.3),
                (Stat::Int, 0.4),
                (Stat::Agi, 0.1),
            ],
            PlayerClass::StrangeAttractor => [
                (Stat::Con, 0.35),
                (Stat::Res, 0.3),
                (Stat::Int, 0.15),
                (Stat::Agi, 0.2),
            ],
        }
    }

    pub fn has_lorenz_aura(self) -> bool {
        self == PlayerClass::StrangeAttractor
    }
}

/// How the player turns a pattern into damage.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Debug,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Illuminator {
    /// Burst every vertex around a target circle.
    #[default]
    Radius,
    /// Light a vertex and its graph neighbours.
    Neighbors,
}

impl Illuminator {
    pub fn action(self) -> ActionKind {
        match self {
            Illuminator::Radius => ActionKind::ActivateAll,
            Illuminator::Neighbors => ActionKind::ActivateSeed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: String,
    pub class: PlayerClass,
    /// Fractal generator in the ability bar.
    pub generator: ActionKind,
    pub illuminator: Illuminator,
    pub attributes: Attributes,
    /// Generators learned from the mentor after creation.
    pub unlocked: Vec<ActionKind>,
    /// Shapes drawn in the fractal editor, replayed by the custom op.
    pub custom_patterns: Vec<Pattern>,
    pub seed: Option<u64>,
}

impl Default for Character {
    fn default() -> Self {
        Character {
            name: "Pandaemonium".into(),
            class: PlayerClass::Kochbender,
            generator: ActionKind::Custom,
            illuminator: Illuminator::Radius,
            attributes: Attributes::new(3, 2, 2, 3),
            unlocked: Vec::new(),
            custom_patterns: Vec::new(),
            seed: None,
        }
    }
}

impl Character {
    /// Starting stat block of the player's body.
    pub fn starting_stats(&self) -> Stats {
        let a = &self.attributes;
        let hp = 20 + a.con as i64 * 6;
        let mana = 50 + a.res as i64 * 12;
        let coherence = a.int as i64 * 20;
        Stats {
            hp,
            max_hp: hp,
            mana,
            max_mana: mana,
            coherence,
            max_coherence: coherence,
            ..Stats::default()
        }
    }

    /// Most pattern vertices that can be held without losing coherence.
    pub fn coherence_limit(&self) -> usize {
        (self.attributes.int.max(0) * 4) as usize
    }

    /// Most vertices that can be channelled by a single activation.
    pub fn strength_limit(&self) -> usize {
        (40 + self.attributes.res.max(0) * 40) as usize
    }

    /// Abilities the player starts with.
    pub fn kit(&self) -> Vec<ActionKind> {
        use ActionKind::*;
        match self.class {
            PlayerClass::Kochbender => {
                let mut ret = vec![Move, Wait, Place, Subdivide, Extend];
                if !ret.contains(&self.generator) {
                    ret.push(self.generator);
                }
                ret.push(self.illuminator.action());
                ret.extend([Reset, Meditate]);
                for &g in &self.unlocked {
                    if !ret.contains(&g) {
                        ret.push(g);
                    }
                }
                ret
            }
            PlayerClass::StrangeAttractor => vec![Move, Wait],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derived_stats() {
        let c = Character::default();
        let s = c.starting_stats();
        assert_eq!(s.max_hp, 38);
        assert_eq!(s.max_mana, 86);
        assert_eq!(s.max_coherence, 40);
        assert_eq!(c.coherence_limit(), 8);
        assert_eq!(c.strength_limit(), 160);
    }

    #[test]
    fn kits() {
        let c = Character::default();
        let kit = c.kit();
        assert!(kit.contains(&ActionKind::Custom));
        assert!(kit.contains(&ActionKind::ActivateAll));
        assert!(!kit.contains(&ActionKind::ActivateSeed));

        let c = Character {
            class: PlayerClass::StrangeAttractor,
            ..Character::default()
        };
        assert_eq!(c.kit(), vec![ActionKind::Move, ActionKind::Wait]);
        assert!(c.class.has_lorenz_aura());
    }

    #[test]
    fn names() {
        assert_eq!(Stat::Int.to_string(), "INT");
        assert_eq!(
            PlayerClass::StrangeAttractor.to_string(),
            "Strange Attractor"
        );
        assert_eq!(
            "attractor".parse::<PlayerClass>().ok(),
            Some(PlayerClass::StrangeAttractor)
        );
        assert_eq!(
            "kochbender".parse::<PlayerClass>().ok(),
            Some(PlayerClass::Kochbender)
        );
    }
}
