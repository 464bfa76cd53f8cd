//! Built-in templates for monsters, items, NPCs and points of interest.

use anyhow::{anyhow, bail};

use crate::{
    prelude::*, ActionKind, Brain, Faction, ItemKind, Result, Rgb,
};

#[derive(Clone, Debug)]
pub struct EnemyTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub glyph: char,
    pub color: Rgb,
    pub hp: i64,
    pub faction: Faction,
    pub brain: Brain,
    pub actions: Vec<ActionKind>,
    pub xp: Option<i64>,
    pub species: &'static str,
    /// Bodies that only exist for the player to wear.
    pub player_only: bool,
}

#[derive(Clone, Debug)]
pub struct EntityTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub glyph: char,
    pub color: Rgb,
    pub kind: ItemKind,
    pub grants_ability: Option<ActionKind>,
    pub description: &'static str,
}

#[derive(Clone, Debug)]
pub struct NpcDef {
    pub id: &'static str,
    pub name: &'static str,
    pub glyph: char,
    pub color: Rgb,
    pub faction: Faction,
    pub description: &'static str,
    pub dialogue: Vec<&'static str>,
    /// Offers to teach generators.
    pub teaches: bool,
    /// Opens the fractal editor when talked to.
    pub opens_editor: bool,
}

#[derive(Clone, Debug)]
pub struct Poi {
    pub id: &'static str,
    pub name: &'static str,
    pub coord: IVec3,
    /// NPC ids with spawn offsets from the zone entry.
    pub npcs: Vec<(&'static str, IVec2)>,
}

#[derive(Clone, Debug)]
pub struct Content {
    pub enemies: Vec<EnemyTemplate>,
    pub entities: Vec<EntityTemplate>,
    pub npcs: Vec<NpcDef>,
    pub pois: Vec<Poi>,
}

fn enemy(
    id: &'static str,
    name: &'static str,
    glyph: char,
    color: Rgb,
    hp: i64,
    brain: Brain,
    xp: i64,
) -> EnemyTemplate {
    EnemyTemplate {
        id,
        name,
        glyph,
        color,
        hp,
        faction: Faction::Hostile,
        brain,
        actions: vec![ActionKind::Move, ActionKind::Wait],
        xp: Some(xp),
        species: id,
        player_only: false,
    }
}

fn item(
    id: &'static str,
    name: &'static str,
    glyph: char,
    color: Rgb,
    kind: ItemKind,
    description: &'static str,
) -> EntityTemplate {
    EntityTemplate {
        id,
        name,
        glyph,
        color,
        kind,
        grants_ability: None,
        description,
    }
}

fn teaching(grants: ActionKind, t: EntityTemplate) -> EntityTemplate {
    EntityTemplate {
        grants_ability: Some(grants),
        ..t
    }
}

impl Content {
    /// The game's own content, with points of interest laid out around the
    /// starting zone `start`.
    pub fn builtin(start: IVec3) -> Self {
        use Brain::*;
        use ItemKind::*;

        let enemies = vec![
            EnemyTemplate {
                actions: vec![ActionKind::Move, ActionKind::Wait, ActionKind::ImpTaunt],
                ..enemy("imp", "Imp", 'i', Rgb(200, 60, 60), 3, Generic, 10)
            },
            enemy("goblin_skirmisher", "Goblin Skirmisher", 'g', Rgb(90, 160, 60), 4, Skirmisher, 12),
            enemy("corrupted_thug", "Corrupted Thug", 'T', Rgb(150, 100, 160), 8, MeleeBrute, 20),
            enemy("vampire_bat", "Vampire Bat", 'b', Rgb(120, 40, 40), 2, DiveBite, 6),
            EnemyTemplate {
                actions: vec![ActionKind::Move, ActionKind::Wait, ActionKind::Yawp],
                ..enemy("raving_lunatic", "Raving Lunatic", 'L', Rgb(220, 200, 90), 5, Lunatic, 10)
            },
            enemy("mana_viper", "Mana Viper", 's', Rgb(80, 120, 230), 3, ManaBite, 14),
            enemy("fractal_echo", "Fractal Echo", 'e', Rgb(180, 180, 255), 4, Generic, 16),
            EnemyTemplate {
                faction: Faction::Player,
                player_only: true,
                xp: None,
                ..enemy("human_base", "Human", '@', Rgb::WHITE, 20, Idle, 0)
            },
        ];

        let entities = vec![
            item("strawberry", "Strawberry", '%', Rgb(230, 40, 60), Berry, "A plump red berry."),
            item("blueberry", "Blueberry", '%', Rgb(60, 80, 220), Berry, "A small dusty berry."),
            item("raspberry", "Raspberry", '%', Rgb(200, 30, 110), Berry, "A knobbly berry."),
            teaching(
                ActionKind::Destabilize,
                item("destabilizer", "Destabilizer", '*', Rgb(255, 0, 255), Trinket, "A humming shard that refuses to stay put."),
            ),
            teaching(
                ActionKind::Rainbow,
                item("prism", "Prism", '^', Rgb(255, 255, 255), Trinket, "Light splits into bands inside it."),
            ),
            teaching(
                ActionKind::Verdant,
                item("verdigris", "Verdigris Ring", 'o', Rgb(60, 200, 120), Trinket, "Green crust creeps along the band."),
            ),
            teaching(
                ActionKind::Ignite,
                item("ember", "Ember", '*', Rgb(255, 120, 30), Trinket, "Warm to the touch, forever."),
            ),
            teaching(
                ActionKind::Regrow,
                item("seedling", "Seedling", '"', Rgb(90, 220, 90), Trinket, "It leans towards any rune."),
            ),
            teaching(
                ActionKind::Freeze,
                item("rime", "Rime Crystal", '*', Rgb(150, 200, 255), Trinket, "Frost blooms where it rests."),
            ),
            teaching(
                ActionKind::PushPattern,
                item("lodestone", "Lodestone", '0', Rgb(120, 120, 130), Trinket, "It tugs at lines of force."),
            ),
            item("inventory", "Inventory", '&', Rgb(180, 140, 80), Container, "A sack that holds things."),
            item("coins", "Coins", '$', Rgb(240, 210, 60), Currency, "A few coins."),
        ];

        let npcs = vec![
            NpcDef {
                id: "mentor",
                name: "Mentor",
                glyph: 'M',
                color: Rgb(240, 220, 140),
                faction: Faction::Npc,
                description: "Old, one-eyed and unerringly optimistic.",
                dialogue: vec![
                    "Ah, another step along the recursion.",
                    "Choose a new pattern to weave into your repertoire.",
                ],
                teaches: true,
                opens_editor: false,
            },
            NpcDef {
                id: "caged_demon",
                name: "Caged Demon",
                glyph: 'D',
                color: Rgb(200, 40, 40),
                faction: Faction::Hostile,
                description: "A hulking demon chained for training bouts.",
                dialogue: vec![
                    "The demon growls, eager to be struck.",
                    "You may practice your strikes here.",
                ],
                teaches: false,
                opens_editor: false,
            },
            NpcDef {
                id: "hexmage",
                name: "The Hexmage",
                glyph: 'H',
                color: Rgb(240, 200, 60),
                faction: Faction::Npc,
                description: "This runecaster is swarming with bees.",
                dialogue: vec![
                    "Weave your sigils on a lattice of hexes.",
                    "I'll open the drafting grid for you.",
                ],
                teaches: false,
                opens_editor: true,
            },
            NpcDef {
                id: "cartographer",
                name: "The Cartographer",
                glyph: 'C',
                color: Rgb(120, 200, 240),
                faction: Faction::Npc,
                description: "Ink stains reach past both elbows.",
                dialogue: vec![
                    "Need more room to sketch? I can unroll a wide parchment.",
                    "Let's draft on a spacious grid.",
                ],
                teaches: false,
                opens_editor: true,
            },
        ];

        let pois = vec![
            Poi {
                id: "mentor_camp",
                name: "Mentor's Camp",
                coord: start,
                npcs: vec![("mentor", ivec2(2, 0))],
            },
            Poi {
                id: "academy",
                name: "The Academy",
                coord: start + ivec3(1, -1, 0),
                npcs: vec![("hexmage", ivec2(1, 1)), ("cartographer", ivec2(-1, 1))],
            },
            Poi {
                id: "training_pit",
                name: "Training Pit",
                coord: start + ivec3(-1, 0, 0),
                npcs: vec![("caged_demon", ivec2(0, 2))],
            },
        ];

        Content {
            enemies,
            entities,
            npcs,
            pois,
        }
    }

    pub fn enemy(&self, id: &str) -> Result<&EnemyTemplate> {
        self.enemies
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("Unknown enemy template '{id}'"))
    }

    /// Enemy template, degrading to the first template on unknown ids.
    pub fn enemy_or_fallback(&self, id: &str) -> Result<&EnemyTemplate> {
        match self.enemy(id) {
            Ok(t) => Ok(t),
            Err(e) => {
                log::warn!("{e}, falling back to first template");
                match self.enemies.first() {
                    Some(t) => Ok(t),
                    None => bail!("No enemy templates to fall back on"),
                }
            }
        }
    }

    /// Ids of templates random spawning may pick.
    pub fn hostile_ids(&self) -> Vec<&'static str> {
        let ret: Vec<&'static str> = self
            .enemies
            .iter()
            .filter(|t| t.faction == Faction::Hostile && !t.player_only)
            .map(|t| t.id)
            .collect();
        if ret.is_empty() {
            vec!["imp"]
        } else {
            ret
        }
    }

    pub fn entity(&self, id: &str) -> Result<&EntityTemplate> {
        self.entities
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("Unknown entity template '{id}'"))
    }

    pub fn npc(&self, id: &str) -> Result<&NpcDef> {
        self.npcs
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("Unknown NPC '{id}'"))
    }

    pub fn poi(&self, id: &str) -> Result<&Poi> {
        self.pois
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("Unknown point of interest '{id}'"))
    }

    pub fn pois_at(&self, coord: IVec3) -> impl Iterator<Item = &Poi> {
        self.pois.iter().filter(move |p| p.coord == coord)
    }

    pub fn berry_ids(&self) -> Vec<&'static str> {
        self.entities
            .iter()
            .filter(|t| t.kind == ItemKind::Berry)
            .map(|t| t.id)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookups() {
        let c = Content::builtin(ivec3(8, 8, 0));
        assert_eq!(c.enemy("imp").unwrap().hp, 3);
        assert!(c.enemy("dragon").is_err());
        assert_eq!(c.enemy_or_fallback("dragon").unwrap().id, "imp");
        assert!(!c.hostile_ids().contains(&"human_base"));
        assert_eq!(
            c.entity("destabilizer").unwrap().grants_ability,
            Some(ActionKind::Destabilize)
        );
        assert_eq!(c.berry_ids().len(), 3);
        assert_eq!(c.poi("academy").unwrap().coord, ivec3(9, 7, 0));
        assert_eq!(c.pois_at(ivec3(8, 8, 0)).count(), 1);
        for poi in &c.pois {
            for (npc, _) in &poi.npcs {
                assert!(c.npc(npc).is_ok());
            }
        }
    }
}
