use serde::{Deserialize, Serialize};

use crate::Rgb;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub walkable: bool,
    /// In the player's field of view right now.
    pub visible: bool,
    /// Has been seen at some point.
    pub explored: bool,
    pub glyph: char,
    pub tint: Option<Rgb>,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::WALL
    }
}

impl Tile {
    pub const WALL: Tile = Tile {
        walkable: false,
        visible: false,
        explored: false,
        glyph: '#',
        tint: None,
    };

    pub const FLOOR: Tile = Tile {
        walkable: true,
        visible: false,
        explored: false,
        glyph: '.',
        tint: None,
    };

    pub fn is_stairs(&self) -> bool {
        matches!(self.glyph, '<' | '>')
    }

    pub fn is_console(&self) -> bool {
        self.glyph == '='
    }
}
