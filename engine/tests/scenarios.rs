//! Whole-game runs through the public interface.

use engine::{
    coverage, prelude::*, Action, ActionRegistry, Attributes, Character, Config,
    Dot, DotKind, Game, Pattern, PlayerClass, Scheduler, Tile, HALF_DIAGONAL,
};
use glam::{dvec2, DVec2};
use quickcheck_macros::quickcheck;

fn new_game(seed: u64, attributes: Attributes) -> Game {
    let character = Character {
        seed: Some(seed),
        attributes,
        ..Character::default()
    };
    Game::new(Config::default(), character, ActionRegistry::standard()).unwrap()
}

/// Empty floor with only the player on it.
fn clear(g: &mut Game) {
    let me = g.player_id();
    let lvl = g.level_mut();
    for id in lvl.entity_ids() {
        if id != me {
            lvl.remove(id);
        }
    }
    lvl.world.fill(Tile::FLOOR);
}

fn hp(g: &Game, id: EntityId) -> i64 {
    g.level().entity(id).and_then(|e| e.actor()).unwrap().stats.hp
}

#[test]
fn overlong_pattern_unravels() {
    let mut g = new_game(100, Attributes::new(3, 2, 5, 3));
    clear(&mut g);
    let anchor = g.player().unwrap().pos;

    // 25 vertices against a budget of 20.
    let verts: Vec<DVec2> = (0..25).map(|i| dvec2(i as f64 * 0.1, 0.0)).collect();
    g.install_pattern(anchor, Pattern::from_graph(verts.clone(), vec![]).unwrap());
    let max = g.player().unwrap().actor().unwrap().stats.max_coherence;

    // A full mind only loses 5 * 50 / 10.
    g.advance(50);
    assert_eq!(g.level().pattern.len(), 25);
    assert_eq!(g.player().unwrap().actor().unwrap().stats.coherence, max - 25);

    // The same drain empties a mind that only had 25 left.
    g.player_mut().unwrap().actor_mut().unwrap().stats.coherence = 25;
    g.advance(50);
    assert!(g.level().pattern.is_empty());
    assert_eq!(g.level().anchor, None);
    assert_eq!(g.player().unwrap().actor().unwrap().stats.coherence, max);
    assert!(g.log.mentions("Your pattern loses coherence and unravels."));
}

#[test]
fn activate_all_full_and_zero_coverage() {
    let mut g = new_game(101, Attributes::new(3, 2, 5, 4));
    clear(&mut g);
    assert_eq!(g.params.int("activate_all", "damage", 0), 2);
    let radius = g.params.float("activate_all", "radius", 0.0);

    let me = g.player().unwrap().pos;
    let dir = if me.x < g.level().world.width() / 2 { ivec2(1, 0) } else { ivec2(-1, 0) };
    let near = g.spawn_enemy_at("imp", me + dir * 3).unwrap();
    let far = g.spawn_enemy_at("imp", me + dir * 6).unwrap();
    for id in [near, far] {
        let s = &mut g.level_mut().entity_mut(id).unwrap().actor_mut().unwrap().stats;
        s.hp = 50;
        s.max_hp = 50;
    }
    g.update_fov();

    // Ten vertices stacked on the near imp.
    let offset = (dir * 3).as_dvec2();
    g.install_pattern(me, Pattern::from_graph(vec![offset; 10], vec![]).unwrap());
    g.queue_player_action(Action::ActivateAll { target: Some(0) }).unwrap();

    assert_eq!(hp(&g, near), 30);
    assert_eq!(hp(&g, far), 50);
    assert!(3.0 >= radius + HALF_DIAGONAL);
    assert_eq!(coverage(radius + HALF_DIAGONAL, radius), 0.0);
    assert_eq!(coverage(0.0, radius), 1.0);
}

#[test]
fn fractional_ticks_add_up() {
    let g = new_game(102, Attributes::new(3, 2, 2, 3));
    let id = g.player_id();
    let mut dot = Dot::new(DotKind::Ignite, 5);
    let total: i64 = (0..5).map(|_| dot.accrue(id, 0.4)).sum();
    assert_eq!(total, 2);
}

#[test]
fn stairs_and_edges_keep_one_body() {
    let character = Character {
        class: PlayerClass::StrangeAttractor,
        seed: Some(103),
        ..Character::default()
    };
    let mut g = Game::new(Config::default(), character, ActionRegistry::standard()).unwrap();
    let me = g.player_id();
    let start = g.zone();
    g.queue_player_action(Action::Wait).unwrap();
    assert!(!g.lorenz().unwrap().points.is_empty());

    let down = g.level().world.down_stairs.unwrap();
    g.player_mut().unwrap().pos = down;
    g.descend().unwrap();
    assert_eq!(g.zone(), start + ivec3(0, 0, 1));
    assert!(!g.visited(start).unwrap().contains(me));
    assert_eq!(g.level().actors().filter(|e| e.id == me).count(), 1);
    let aura = g.lorenz().unwrap();
    assert!(aura.points.is_empty());
    assert!(aura.reset_trails);
    assert_eq!(aura.center, g.player().map(|e| e.pos.as_dvec2()));

    g.ascend().unwrap();
    assert_eq!(g.zone(), start);
    assert!(!g.visited(start + ivec3(0, 0, 1)).unwrap().contains(me));

    // Off the west edge into the next screen.
    g.player_mut().unwrap().pos = ivec2(0, 5);
    g.queue_player_action(Action::Move(ivec2(-1, 0))).unwrap();
    assert_eq!(g.zone(), start - ivec3(1, 0, 0));
    assert!(g.level().contains(me));
    assert!(!g.visited(start).unwrap().contains(me));
    assert_eq!(g.level().actors().filter(|e| e.id == me).count(), 1);
}

#[test]
fn spawning_is_deterministic() {
    fn spawned(seed: u64) -> Vec<(IVec2, Option<String>)> {
        let mut g = new_game(seed, Attributes::new(3, 2, 2, 3));
        clear(&mut g);
        let me = g.player_id();
        let zone = g.zone();
        assert_eq!(g.spawn_enemies(zone, 4).unwrap(), 4);
        g.level()
            .actors()
            .filter(|e| e.id != me)
            .map(|e| (e.pos, e.template.clone()))
            .collect()
    }
    let a = spawned(104);
    assert_eq!(a.len(), 4);
    assert_eq!(a, spawned(104));
}

#[test]
fn locked_parameter_tier() {
    let mut g = new_game(105, Attributes::new(3, 2, 2, 3));
    assert_eq!(g.params.index("branch", "angle"), 2);
    assert_eq!(
        g.adjust_param("branch", "angle", 1),
        (false, "Requires INT 3".to_string())
    );
    assert_eq!(g.params.index("branch", "angle"), 2);
    assert_eq!(g.adjust_param("branch", "angle", -1), (true, String::new()));
    assert_eq!(g.params.int("branch", "angle", 0), 35);
}

#[quickcheck]
fn clock_lands_exactly(deltas: Vec<u8>) -> bool {
    let mut g = new_game(106, Attributes::new(3, 2, 2, 3));
    deltas.into_iter().take(10).all(|d| {
        let before = g.level().now();
        g.advance(d as i64);
        g.level().now() == before + d as i64
    })
}

#[test]
fn same_tick_runs_in_order() {
    let mut s = Scheduler::default();
    s.schedule(5, "first");
    s.schedule(3, "early");
    s.schedule(5, "second");
    s.schedule(5, "third");
    let target = s.now() + 5;
    let mut out = Vec::new();
    while let Some(x) = s.pop_due(target) {
        out.push(x);
    }
    assert_eq!(out, vec!["early", "first", "second", "third"]);
}
