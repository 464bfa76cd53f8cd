use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use engine::{
    prelude::*, Action, ActionKind, ActionRegistry, Character, Config, Faction,
    Game, PlayerClass,
};
use rand::{seq::SliceRandom, SeedableRng};
use util::GameRng;

pub const GAME_NAME: &str = "edgecaster";

#[derive(Parser, Debug)]
#[command(about = "Run an Edgecaster character on autopilot and print its log")]
struct Args {
    #[arg(long, help = "Game world seed")]
    seed: Option<u64>,

    #[arg(long, default_value = "kochbender", help = "Character class")]
    class: PlayerClass,

    #[arg(long, default_value_t = 200, help = "Player turns to play")]
    turns: usize,

    #[arg(long, help = "IDM file overriding simulation constants")]
    tuning: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Config::parse(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Nearest hostile the player can see.
fn visible_foe(g: &Game) -> Option<IVec2> {
    let pos = g.player()?.pos;
    let lvl = g.level();
    lvl.actors()
        .filter(|e| {
            e.is_alive()
                && e.faction() == Some(Faction::Hostile)
                && lvl.world.is_visible(e.pos)
        })
        .map(|e| e.pos)
        .min_by_key(|p| (*p - pos).cheb_len())
}

fn knows(g: &Game, kind: ActionKind) -> bool {
    g.player()
        .and_then(|e| e.actor())
        .is_some_and(|a| a.actions.contains(&kind))
}

/// Pick and perform one player move.
fn autopilot(g: &mut Game, rng: &mut GameRng) -> anyhow::Result<()> {
    let Some(pos) = g.player().map(|e| e.pos) else {
        return Ok(());
    };

    if let Some(foe) = visible_foe(g) {
        if (foe - pos).cheb_len() == 1 {
            return g.queue_player_action(Action::Move(foe - pos));
        }
        if knows(g, ActionKind::Place) {
            if g.level().pattern.is_empty() {
                g.queue_player_action(Action::Place)?;
                g.try_place_terminus(foe);
                return Ok(());
            }
            if g.level().pattern.len() < 8 && knows(g, ActionKind::Subdivide) {
                return g.queue_player_action(Action::Subdivide);
            }
            if let Some(anchor) = g.level().anchor {
                let local = (foe - anchor).as_dvec2();
                let target = g.level().pattern.nearest_vertex(local);
                return g.queue_player_action(Action::ActivateAll { target });
            }
        }
    }

    let Some(&dir) = DIR_8.choose(rng) else {
        return Ok(());
    };
    g.queue_player_action(Action::Move(dir))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let cfg = load_config(args.tuning.as_ref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed: {seed}");

    let character = Character {
        class: args.class,
        seed: Some(seed),
        ..Character::default()
    };
    let mut game = Game::new(cfg, character, ActionRegistry::standard())?;
    let mut rng = GameRng::seed_from_u64(seed);

    for _ in 0..args.turns {
        while game.urgent().is_some() {
            game.resolve_urgent(0)?;
        }
        if !game.player_alive() {
            break;
        }
        if let Err(e) = autopilot(&mut game, &mut rng) {
            log::warn!("autopilot: {e:#}");
            game.queue_player_action(Action::Wait)?;
        }

        for line in game.log.drain() {
            println!("{line}");
        }
    }

    let z = game.zone();
    println!(
        "{GAME_NAME}: {} at zone {},{} depth {}, tick {}",
        game.host_label(),
        z.x,
        z.y,
        z.z,
        game.now().ticks()
    );
    Ok(())
}
