use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Tunable constants of the simulation.
///
/// Deserializes with every field optional so a tuning file only needs to
/// list the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub world_width: i32,
    pub world_height: i32,
    /// Overworld extent in zones along each axis.
    pub world_map_screens: i32,
    pub fov_radius: i32,

    pub max_vertices: usize,
    pub action_time_instant: i64,
    pub action_time_fast: i64,
    pub action_time_slow: i64,
    pub place_time_ticks: i64,
    pub place_range: f64,
    pub pattern_overlay_ttl: i64,

    pub xp_per_kill: i64,
    pub xp_base: i64,
    pub xp_per_level: i64,

    pub currency_min: i64,
    pub currency_max: i64,
    pub currency_drop_chance: f64,
    pub enemies_per_zone: usize,

    /// Lifetime of an ignite or regrow effect.
    pub dot_duration: i64,
    pub ignite_rate: f64,
    pub regrow_rate: f64,
    /// Intensity multiplier for tiles next to the pattern.
    pub dot_indirect_factor: f64,

    pub freeze_damage: f64,
    pub freeze_slow_scale: f64,
    pub freeze_slow_cap: f64,
    pub slow_decay_step: f64,
    pub slow_decay_interval: i64,

    pub lorenz_sigma: f64,
    pub lorenz_rho: f64,
    pub lorenz_beta: f64,
    pub lorenz_dt: f64,
    pub lorenz_steps_per_tick: i64,
    pub lorenz_noise: f64,
    pub lorenz_angle_deg: f64,
    pub lorenz_scale: f64,
    pub lorenz_radius: f64,

    /// Ticks between steps of a drifting pattern.
    pub motion_interval: i64,
    /// Longest drift step of a pushed pattern, in tiles.
    pub push_range: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            world_width: 40,
            world_height: 24,
            world_map_screens: 16,
            fov_radius: 8,

            max_vertices: 50_000,
            action_time_instant: 0,
            action_time_fast: 10,
            action_time_slow: 20,
            place_time_ticks: 5,
            place_range: 8.0,
            pattern_overlay_ttl: 15,

            xp_per_kill: 10,
            xp_base: 20,
            xp_per_level: 10,

            currency_min: 1,
            currency_max: 6,
            currency_drop_chance: 0.5,
            enemies_per_zone: 4,

            dot_duration: 30,
            ignite_rate: 1.0,
            regrow_rate: 0.5,
            dot_indirect_factor: 0.5,

            freeze_damage: 2.0,
            freeze_slow_scale: 0.5,
            freeze_slow_cap: 4.0,
            slow_decay_step: 0.1,
            slow_decay_interval: 10,

            lorenz_sigma: 10.0,
            lorenz_rho: 28.0,
            lorenz_beta: 8.0 / 3.0,
            lorenz_dt: 0.01,
            lorenz_steps_per_tick: 1,
            lorenz_noise: 0.0007,
            lorenz_angle_deg: 30.0,
            lorenz_scale: 0.18,
            lorenz_radius: 7.0,

            motion_interval: 10,
            push_range: 5.0,
        }
    }
}

impl Config {
    /// Read a tuning file in IDM, fields not listed keep their defaults.
    pub fn parse(text: &str) -> Result<Self> {
        idm::from_str(text).context("bad tuning file")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tuning_overrides_single_fields() {
        let text = idm::to_string(&Config::default()).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), Config::default());

        let mut tweaked = Config::default();
        tweaked.place_range = 4.5;
        let line = idm::to_string(&tweaked)
            .unwrap()
            .lines()
            .find(|l| l.starts_with("place-range"))
            .unwrap()
            .to_string();
        let cfg = Config::parse(&line).unwrap();
        assert_eq!(cfg.place_range, 4.5);
        assert_eq!(cfg.fov_radius, Config::default().fov_radius);
    }
}
