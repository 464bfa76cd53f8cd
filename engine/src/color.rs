use serde::{Deserialize, Serialize};

/// 24-bit color attached to pattern vertices, edges and tiles.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GREEN: Rgb = Rgb(0, 255, 0);

    /// Red, orange, yellow, green, blue, indigo, violet.
    pub const RAINBOW: [Rgb; 7] = [
        Rgb(255, 0, 0),
        Rgb(255, 127, 0),
        Rgb(255, 255, 0),
        Rgb(0, 255, 0),
        Rgb(0, 0, 255),
        Rgb(75, 0, 130),
        Rgb(148, 0, 211),
    ];

    /// How far red stands out from the other channels, 0..=255.
    pub fn redness(self) -> u8 {
        self.0.saturating_sub(self.1.max(self.2))
    }

    pub fn greenness(self) -> u8 {
        self.1.saturating_sub(self.0.max(self.2))
    }

    pub fn blueness(self) -> u8 {
        self.2.saturating_sub(self.0.max(self.1))
    }

    /// Linear blend towards `other`, `t` in [0, 1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix =
            |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channel_dominance() {
        assert_eq!(Rgb(255, 0, 0).redness(), 255);
        assert_eq!(Rgb(255, 127, 0).redness(), 128);
        assert_eq!(Rgb(255, 255, 0).redness(), 0);
        assert_eq!(Rgb(0, 0, 255).blueness(), 255);
        assert_eq!(Rgb(75, 0, 130).blueness(), 55);
        assert_eq!(Rgb::WHITE.greenness(), 0);
        assert_eq!(Rgb::WHITE.lerp(Rgb::GREEN, 1.0), Rgb::GREEN);
        assert_eq!(Rgb::WHITE.lerp(Rgb::GREEN, 0.5), Rgb(128, 255, 128));
    }
}
