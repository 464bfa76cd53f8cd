//! Top-level simulation state, the action dispatcher and time advancement.

use std::collections::VecDeque;

use anyhow::anyhow;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use util::{GameRng, RngExt};

use crate::{
    prelude::*, Action, ActionKind, ActionRegistry, Actor, Ai, Brain, Character,
    Config, Content, Entity, EntityId, Faction, FractalField, Instant, Level,
    LorenzAura, MessageLog, OverworldEvent, Params, Pending, Result, StandardAi,
    Stats, Status, World, WorldMap,
};

/// A modal interruption the presentation layer should show.
#[derive(Clone, Debug, PartialEq)]
pub struct Urgent {
    pub title: String,
    pub body: String,
    pub choices: Vec<String>,
    pub(crate) effect: Option<UrgentEffect>,
}

/// What picking a choice of an urgent message does.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UrgentEffect {
    Event(OverworldEvent),
    /// Offer to teach the listed generators.
    Teach(Vec<ActionKind>),
    /// Offer to open the fractal editor.
    Draft(String),
}

/// Where a cooldown is tracked for an actor's use of an ability.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Origin {
    /// Inventory slot of the item granting the ability.
    Item(usize),
    Actor,
}

pub struct Game {
    pub cfg: Config,
    pub character: Character,
    pub params: Params,
    pub log: MessageLog,
    pub(crate) rng: GameRng,
    pub(crate) registry: ActionRegistry,
    pub(crate) ai: Box<dyn Ai>,
    pub(crate) content: Content,

    /// The zone the player is in.
    pub(crate) level: Level,
    /// Every other zone visited so far.
    pub(crate) levels: HashMap<IVec3, Level>,
    pub(crate) zone: IVec3,
    pub(crate) player: EntityId,
    pub(crate) next_id: u32,
    pub(crate) inventories: HashMap<EntityId, Vec<Entity>>,

    pub(crate) lorenz: Option<LorenzAura>,
    pub(crate) host_label: String,
    pub(crate) start_zone: IVec3,
    pub(crate) lab_zone: IVec3,
    pub(crate) field: FractalField,
    pub(crate) world_map: WorldMap,

    urgent: VecDeque<Urgent>,
    urgent_callback: Option<Box<dyn FnMut(&Urgent)>>,
    /// The presentation layer should open the fractal editor.
    pub editor_requested: bool,
    /// The presentation layer should show the world map.
    pub map_requested: bool,
    pub(crate) academy_hint_shown: bool,
}

impl Game {
    /// Start a new run.
    pub fn new(
        cfg: Config,
        character: Character,
        registry: ActionRegistry,
    ) -> Result<Game> {
        let seed = character.seed.unwrap_or_else(rand::random);
        log::info!("new game, seed {seed}");
        let mut rng = GameRng::seed_from_u64(seed);

        let span = cfg.world_map_screens.max(1);
        let start = ivec3(span / 2, span / 2, 0);
        let lab_zone = loop {
            let z = ivec3(rng.gen_range(0..span), rng.gen_range(0..span), 0);
            if z != start || span == 1 {
                break z;
            }
        };

        let screen = ivec2(cfg.world_width, cfg.world_height);
        let field = FractalField::new(seed, screen * span);
        let world_map = WorldMap::spawn(field, span, screen);

        let mut params = Params::default();
        params.auto_max(&character.attributes);

        let lorenz = character.class.has_lorenz_aura().then(|| LorenzAura::new(2));
        let host_label = character.class.to_string();

        let mut game = Game {
            level: Level::new(start, World::new(cfg.world_width, cfg.world_height)),
            cfg,
            character,
            params,
            log: MessageLog::default(),
            rng,
            registry,
            ai: Box::new(StandardAi),
            content: Content::builtin(start),
            levels: Default::default(),
            zone: start,
            player: EntityId(0),
            next_id: 1,
            inventories: Default::default(),
            lorenz,
            host_label,
            start_zone: start,
            lab_zone,
            field,
            world_map,
            urgent: Default::default(),
            urgent_callback: None,
            editor_requested: false,
            map_requested: false,
            academy_hint_shown: false,
        };

        game.make_zone(start, None)?;
        game.level = game
            .levels
            .remove(&start)
            .ok_or_else(|| anyhow!("start zone was not generated"))?;

        let body = game.make_player_body()?;
        game.player = body.id;
        let pos = body.pos;
        game.level.insert(body);

        let zc = game.zone;
        if let Some(p) = game.level.nearest_free(pos, 3) {
            let bag = game.make_item("inventory", p)?;
            game.level.insert(bag);
        }
        let n = game.cfg.enemies_per_zone;
        game.spawn_enemies(zc, n)?;

        let name = game.character.name.clone();
        msg!(game, "Welcome, {name}.");
        msg!(game, "Imps lurk nearby.");

        if let Some(aura) = game.lorenz.as_mut() {
            aura.reset(pos, zc);
        }
        game.update_fov();

        let lab = game.lab_zone;
        msg!(
            game,
            "A mysterious lab is rumored at overworld zone ({}, {}).",
            lab.x,
            lab.y
        );
        Ok(game)
    }

    /// Replace the monster decision layer.
    pub fn with_ai(mut self, ai: impl Ai + 'static) -> Self {
        self.ai = Box::new(ai);
        self
    }

    fn make_player_body(&mut self) -> Result<Entity> {
        let t = self.content.enemy("human_base")?.clone();
        let mut stats = self.character.starting_stats();
        stats.level = 1;
        stats.xp_to_next = self.xp_needed(1);

        let mut actor = Actor::new(Faction::Player, stats);
        actor.actions = self.character.kit();
        actor.brain = Brain::Idle;
        actor.species = Some(t.species.to_string());
        actor.is_player = true;

        let world = &self.level.world;
        let pos = self.level.nearest_free(world.entry, 12).unwrap_or(world.entry);

        let id = self.alloc_id();
        let mut e = Entity::new(id, self.character.name.clone(), crate::EntityKind::Actor(actor));
        e.pos = pos;
        e.glyph = t.glyph;
        e.color = t.color;
        e.template = Some(t.id.to_string());
        Ok(e)
    }

    pub(crate) fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    // Views for the presentation layer.

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn zone(&self) -> IVec3 {
        self.zone
    }

    pub fn now(&self) -> Instant {
        self.level.now()
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player(&self) -> Option<&Entity> {
        self.level.entity(self.player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.level.entity_mut(self.player)
    }

    pub fn player_alive(&self) -> bool {
        self.player().is_some_and(|e| e.is_alive())
    }

    pub fn lorenz(&self) -> Option<&LorenzAura> {
        self.lorenz.as_ref()
    }

    pub fn host_label(&self) -> &str {
        &self.host_label
    }

    pub fn lab_zone(&self) -> IVec3 {
        self.lab_zone
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn world_map(&self) -> &WorldMap {
        &self.world_map
    }

    pub fn world_map_mut(&mut self) -> &mut WorldMap {
        &mut self.world_map
    }

    /// Zone at a coordinate if it has been visited.
    pub fn visited(&self, coord: IVec3) -> Option<&Level> {
        self.lvl(coord)
    }

    pub(crate) fn lvl(&self, zc: IVec3) -> Option<&Level> {
        match self.levels.get(&zc) {
            Some(l) => Some(l),
            None if zc == self.zone => Some(&self.level),
            None => None,
        }
    }

    pub(crate) fn lvl_mut(&mut self, zc: IVec3) -> Option<&mut Level> {
        if self.levels.contains_key(&zc) {
            self.levels.get_mut(&zc)
        } else if zc == self.zone {
            Some(&mut self.level)
        } else {
            None
        }
    }

    pub(crate) fn entity_in(&self, zc: IVec3, id: EntityId) -> Option<&Entity> {
        self.lvl(zc)?.entity(id)
    }

    pub(crate) fn entity_in_mut(
        &mut self,
        zc: IVec3,
        id: EntityId,
    ) -> Option<&mut Entity> {
        self.lvl_mut(zc)?.entity_mut(id)
    }

    pub(crate) fn player_pos(&self) -> Option<IVec2> {
        self.player().map(|e| e.pos)
    }

    pub(crate) fn player_stats(&self) -> Option<&Stats> {
        self.player().and_then(|e| e.actor()).map(|a| &a.stats)
    }

    pub(crate) fn player_stats_mut(&mut self) -> Option<&mut Stats> {
        self.player_mut()
            .and_then(|e| e.actor_mut())
            .map(|a| &mut a.stats)
    }

    // Urgent messages.

    /// Install the hook told about every new urgent message.
    pub fn set_urgent_callback(&mut self, cb: impl FnMut(&Urgent) + 'static) {
        self.urgent_callback = Some(Box::new(cb));
    }

    /// The urgent message waiting for an answer.
    pub fn urgent(&self) -> Option<&Urgent> {
        self.urgent.front()
    }

    pub(crate) fn set_urgent(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        choices: &[&str],
        effect: Option<UrgentEffect>,
    ) {
        let urgent = Urgent {
            title: title.into(),
            body: body.into(),
            choices: choices.iter().map(|s| s.to_string()).collect(),
            effect,
        };
        self.log.add(urgent.body.clone());
        if let Some(cb) = self.urgent_callback.as_mut() {
            cb(&urgent);
        }
        self.urgent.push_back(urgent);
    }

    /// Answer the pending urgent message with the choice at `choice`.
    pub fn resolve_urgent(&mut self, choice: usize) -> Result<()> {
        let Some(urgent) = self.urgent.pop_front() else {
            return Ok(());
        };
        match urgent.effect {
            None => Ok(()),
            Some(UrgentEffect::Event(ev)) => self.apply_event(ev, choice),
            Some(UrgentEffect::Teach(options)) => {
                self.finish_teaching(&options, choice);
                Ok(())
            }
            Some(UrgentEffect::Draft(npc)) => {
                self.finish_drafting(&npc, choice);
                Ok(())
            }
        }
    }

    // Actions.

    /// Perform an action for an actor and then pay its time cost.
    ///
    /// The effect happens before time advances. Refused actions cost no
    /// time. Unknown actions are an error.
    pub fn queue_actor_action(&mut self, actor: EntityId, action: Action) -> Result<()> {
        let zc = self.zone_of(actor).ok_or_else(|| anyhow!("No actor {actor}"))?;
        let kind = action.kind();
        let def = self.registry.def(kind)?;
        let (cooldown, speed) = (def.cooldown, def.speed);
        let is_player = actor == self.player;

        if !self.entity_in(zc, actor).is_some_and(|e| e.is_alive()) {
            return Ok(());
        }

        if !self.knows(zc, actor, kind) {
            if is_player {
                msg!(self, "You don't know how to do that.");
            }
            return Ok(());
        }

        let origin = self.cooldown_origin(actor, kind);
        if self.cooldown_at(zc, actor, origin, kind) > 0 {
            if is_player {
                msg!(self, "That ability is recharging.");
            }
            return Ok(());
        }

        self.perform(zc, actor, &action)?;

        if cooldown > 0 {
            self.set_cooldown(zc, actor, origin, kind, cooldown);
        }

        let slow = self
            .zone_of(actor)
            .and_then(|z| self.entity_in(z, actor))
            .and_then(|e| e.actor())
            .map_or(1.0, |a| a.slow_factor());
        let delay = (speed.ticks(&self.cfg) as f64 * slow).round() as i64;
        self.advance_time(zc, delay);
        Ok(())
    }

    pub fn queue_player_action(&mut self, action: Action) -> Result<()> {
        self.queue_actor_action(self.player, action)
    }

    /// Queue a parameterless action by its registry name.
    pub fn queue_named_action(&mut self, actor: EntityId, name: &str) -> Result<()> {
        let action = self.action_by_name(name)?;
        self.queue_actor_action(actor, action)
    }

    /// Resolve a registry name into an action without parameters.
    pub fn action_by_name(&self, name: &str) -> Result<Action> {
        self.registry.get(name)?;
        let (kind, slot) =
            ActionKind::parse(name).ok_or_else(|| anyhow!("Unknown action '{name}'"))?;
        Action::bare(kind, slot)
            .ok_or_else(|| anyhow!("Action '{name}' needs parameters"))
    }

    /// Zone the actor is in, checking the current one first.
    pub(crate) fn zone_of(&self, id: EntityId) -> Option<IVec3> {
        if self.level.contains(id) {
            return Some(self.zone);
        }
        self.levels
            .iter()
            .find(|(_, l)| l.contains(id))
            .map(|(&c, _)| c)
    }

    fn knows(&self, zc: IVec3, actor: EntityId, kind: ActionKind) -> bool {
        if kind.is_innate() {
            return true;
        }
        if self
            .entity_in(zc, actor)
            .and_then(|e| e.actor())
            .is_some_and(|a| a.actions.contains(&kind))
        {
            return true;
        }
        self.inventory(actor)
            .iter()
            .any(|i| i.item().is_some_and(|i| i.grants_ability == Some(kind)))
    }

    fn cooldown_origin(&self, actor: EntityId, kind: ActionKind) -> Origin {
        self.inventory(actor)
            .iter()
            .position(|i| i.item().is_some_and(|i| i.grants_ability == Some(kind)))
            .map_or(Origin::Actor, Origin::Item)
    }

    fn cooldown_at(&self, zc: IVec3, actor: EntityId, origin: Origin, kind: ActionKind) -> i64 {
        match origin {
            Origin::Item(i) => self
                .inventories
                .get(&actor)
                .and_then(|inv| inv.get(i))
                .map_or(0, |e| e.cooldown(kind)),
            Origin::Actor => self.entity_in(zc, actor).map_or(0, |e| e.cooldown(kind)),
        }
    }

    fn set_cooldown(
        &mut self,
        zc: IVec3,
        actor: EntityId,
        origin: Origin,
        kind: ActionKind,
        ticks: i64,
    ) {
        let target = match origin {
            Origin::Item(i) => self.inventories.get_mut(&actor).and_then(|inv| inv.get_mut(i)),
            Origin::Actor => {
                // The actor may have changed zones while acting.
                let zc = self.zone_of(actor).unwrap_or(zc);
                self.entity_in_mut(zc, actor)
            }
        };
        if let Some(e) = target {
            e.cooldowns.insert(kind, ticks);
        }
    }

    /// Run the effect of an action right away.
    pub(crate) fn perform(&mut self, zc: IVec3, actor: EntityId, action: &Action) -> Result<()> {
        use Action::*;

        let kind = action.kind();
        if (kind.is_fractal_op()
            || matches!(
                kind,
                ActionKind::Place
                    | ActionKind::Rainbow
                    | ActionKind::Verdant
                    | ActionKind::PushPattern
                    | ActionKind::ActivateAll
                    | ActionKind::ActivateSeed
                    | ActionKind::Reset
                    | ActionKind::Ignite
                    | ActionKind::Regrow
                    | ActionKind::Freeze
            ))
            && actor != self.player
        {
            // Runes belong to the player.
            return Ok(());
        }

        match action {
            Move(dir) => self.move_or_attack(zc, actor, *dir)?,
            Wait => {}
            Look(pos) => self.look(zc, actor, *pos),
            Yawp => self.yawp(zc, actor),
            ImpTaunt => self.taunt(zc, actor),
            Place => self.begin_place(),
            Subdivide | Extend | Koch | Branch | Zigzag | Custom(_) => {
                self.fractal_op(action)
            }
            Destabilize => self.destabilize(zc, actor),
            Rainbow => self.rainbow(),
            Verdant => self.verdant(),
            PushPattern { target, rotation } => self.push_pattern(*target, *rotation),
            ActivateAll { target } => self.activate_all(*target),
            ActivateSeed { target } => self.activate_seed(*target),
            Reset => self.reset_rune(),
            Meditate => self.meditate(zc, actor),
            Ignite => self.start_dot(crate::DotKind::Ignite),
            Regrow => self.start_dot(crate::DotKind::Regrow),
            Freeze => self.freeze(),
        }
        Ok(())
    }

    // Time.

    /// Let `delta` ticks pass in the current zone.
    pub fn advance(&mut self, delta: i64) {
        self.advance_time(self.zone, delta);
    }

    /// Run every event of zone `zc` due within `delta` ticks, then the
    /// per-call sub-ticks. The zone clock ends exactly `delta` ahead.
    pub(crate) fn advance_time(&mut self, zc: IVec3, delta: i64) {
        assert!(delta >= 0, "negative time step {delta}");
        let Some(target) = self.lvl(zc).map(|l| l.now() + delta) else {
            return;
        };

        loop {
            let Some(item) = self.lvl_mut(zc).and_then(|l| l.events.pop_due(target))
            else {
                break;
            };
            self.dispatch(zc, item);
        }

        if let Some(lvl) = self.lvl_mut(zc) {
            lvl.events.settle(target);
            if lvl.activation_ttl > 0 {
                lvl.activation_ttl = (lvl.activation_ttl - delta).max(0);
                if lvl.activation_ttl == 0 {
                    lvl.activation_points.clear();
                }
            }
        }

        if zc == self.zone {
            if self.level.need_fov {
                self.update_fov();
            }
            self.lorenz_tick(delta);
            self.coherence_tick(delta);
        }
        self.cooldown_tick(zc, delta);
        self.status_tick(zc, delta);
        self.motion_tick(zc, delta);
    }

    fn dispatch(&mut self, zc: IVec3, item: Pending) {
        match item {
            Pending::ActorTurn(id) => self.monster_act(zc, id),
            Pending::PlaceTerminus { anchor, terminus } => {
                self.place_terminus(zc, anchor, terminus)
            }
            Pending::Dot(dot) => self.dot_tick(zc, dot),
        }
    }

    /// Take one turn of a non-player actor and queue its next one.
    fn monster_act(&mut self, zc: IVec3, id: EntityId) {
        let fast = self.cfg.action_time_fast;
        let Some(ent) = self.entity_in(zc, id) else {
            return;
        };
        // The chain ends with the actor's death or the player taking over
        // the body.
        if !ent.is_alive() || id == self.player {
            return;
        }
        let name = ent.name.clone();
        let distracted = ent.has_status(Status::Distracted);

        if !self.lvl(zc).is_some_and(|l| l.contains(self.player)) {
            if let Some(lvl) = self.lvl_mut(zc) {
                lvl.schedule(fast, Pending::ActorTurn(id));
            }
            return;
        }

        if distracted {
            let falter = self.rng.chance(0.3);
            if let Some(e) = self.entity_in_mut(zc, id) {
                e.tick_status(Status::Distracted);
            }
            if falter {
                msg!(self, "The distracted {name} falters.");
                if let Some(lvl) = self.lvl_mut(zc) {
                    lvl.schedule(fast, Pending::ActorTurn(id));
                }
                return;
            }
        }

        let choice = match self.lvl(zc) {
            Some(lvl) => self.ai.choose_action(self, lvl, id),
            None => return,
        };
        let action = choice.unwrap_or_else(|e| {
            log::warn!("AI for {id} failed: {e:#}");
            Action::Wait
        });

        let delay = match self.registry.delay(action.kind(), &self.cfg) {
            Ok(d) => {
                if let Err(e) = self.perform(zc, id, &action) {
                    log::warn!("{id} failed to {:?}: {e:#}", action);
                }
                d
            }
            Err(e) => {
                log::warn!("{id} chose an unregistered action: {e:#}");
                fast
            }
        };

        let Some(ent) = self.entity_in(zc, id) else {
            return;
        };
        if !ent.is_alive() {
            return;
        }
        let slow = ent.actor().map_or(1.0, |a| a.slow_factor());
        let delay = ((delay as f64 * slow).round() as i64).max(1);
        if let Some(lvl) = self.lvl_mut(zc) {
            lvl.schedule(delay, Pending::ActorTurn(id));
        }
    }

    /// Whether an actor already has a turn waiting in its zone.
    pub(crate) fn has_turn_pending(&self, zc: IVec3, id: EntityId) -> bool {
        self.lvl(zc)
            .is_some_and(|l| l.events.pending().any(|p| *p == Pending::ActorTurn(id)))
    }

    /// Drain coherence while the held pattern is over the vertex budget.
    fn coherence_tick(&mut self, delta: i64) {
        let limit = self.character.coherence_limit();
        let over = self.level.pattern.len().saturating_sub(limit);
        if over == 0 {
            return;
        }
        let drain = over as f64 * delta as f64 / 10.0;
        let Some(stats) = self.player_stats_mut() else {
            return;
        };
        stats.coherence = (stats.coherence as f64 - drain).max(0.0) as i64;
        if stats.coherence <= 0 {
            stats.coherence = stats.max_coherence;
            self.level.clear_pattern();
            msg!(self, "Your pattern loses coherence and unravels.");
        }
    }

    fn cooldown_tick(&mut self, zc: IVec3, delta: i64) {
        if delta <= 0 {
            return;
        }
        if let Some(lvl) = self.lvl_mut(zc) {
            for id in lvl.entity_ids() {
                if let Some(e) = lvl.entity_mut(id) {
                    e.tick_cooldowns(delta);
                }
            }
        }
        for inv in self.inventories.values_mut() {
            for e in inv.iter_mut() {
                e.tick_cooldowns(delta);
            }
        }
    }

    /// Decay timed statuses and freezing slowdowns.
    fn status_tick(&mut self, zc: IVec3, delta: i64) {
        if delta <= 0 {
            return;
        }
        let (step, interval) = (self.cfg.slow_decay_step, self.cfg.slow_decay_interval.max(1));
        let Some(lvl) = self.lvl_mut(zc) else {
            return;
        };
        for id in lvl.actor_ids() {
            let Some(e) = lvl.entity_mut(id) else { continue };
            for status in [Status::Blessed, Status::Cursed] {
                if let Some(n) = e.statuses.get_mut(&status) {
                    *n -= delta;
                    if *n <= 0 {
                        e.statuses.remove(&status);
                    }
                }
            }
            let Some(actor) = e.actor_mut() else { continue };
            if let Some(slow) = actor.slow.as_mut() {
                slow.timer += delta;
                while slow.timer >= interval {
                    slow.timer -= interval;
                    slow.factor -= step;
                }
                if slow.factor <= 1.0 + 1e-9 {
                    actor.slow = None;
                }
            }
        }
    }

    /// Step the aura swarm and let it sting whatever hostile it touches.
    fn lorenz_tick(&mut self, delta: i64) {
        if delta == 0 {
            return;
        }
        let Some(pos) = self.player_pos() else {
            return;
        };
        let zone = self.zone;
        let Some(aura) = self.lorenz.as_mut() else {
            return;
        };
        aura.reset_trails = false;
        aura.advance(pos, zone, delta, &self.cfg, &mut self.rng);
        let hits = aura.tile_hits(&self.cfg);
        if hits.is_empty() {
            return;
        }

        const VERBS: [&str; 9] = [
            "cuts", "slices", "singes", "shocks", "jolts", "burns", "blinds", "chars",
            "sears",
        ];

        for id in self.level.actor_ids() {
            let Some(e) = self.level.entity(id) else { continue };
            if id == self.player || !e.is_alive() || e.faction() != Some(Faction::Hostile) {
                continue;
            }
            let Some(&n) = hits.get(&e.pos) else { continue };
            let name = e.name.clone();

            let Some(hit) = self.hurt(zone, id, n) else { continue };
            let verb = VERBS.choose(&mut self.rng).copied().unwrap_or("cuts");
            msg!(self, "Your butterfly {verb} the {name} for {} damage.", hit.dealt);

            if self.rng.chance(0.5) {
                if let Some(e) = self.level.entity_mut(id) {
                    let fresh = !e.has_status(Status::Distracted);
                    let n = e.statuses.entry(Status::Distracted).or_insert(0);
                    *n = (*n).max(1);
                    if fresh {
                        msg!(self, "The {name} seems distracted by the butterflies.");
                    }
                }
            }

            if hit.dead {
                msg!(self, "{name} dies.");
                self.kill_actor(zone, id, true);
            }
        }
    }

    /// Recompute the player's view of the current zone.
    pub fn update_fov(&mut self) {
        let Some(pos) = self.player_pos() else {
            return;
        };
        let fresh = self.level.update_fov(pos, self.cfg.fov_radius, self.player);
        for id in fresh {
            if let Some(e) = self.level.entity(id) {
                let name = e.a_name();
                msg!(self, "You spot {name}.");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::{Pattern, Tile};

    pub(crate) fn game(seed: u64) -> Game {
        let character = Character {
            seed: Some(seed),
            ..Character::default()
        };
        Game::new(Config::default(), character, ActionRegistry::standard()).unwrap()
    }

    /// Open field with nothing else in it.
    pub(crate) fn clear_zone(g: &mut Game) {
        for id in g.level.entity_ids() {
            if id != g.player {
                g.level.remove(id);
            }
        }
        g.level.world.fill(Tile::FLOOR);
    }

    /// Give the host a single motionless butterfly hovering `dx` tiles
    /// east of it.
    pub(crate) fn pin_butterfly(g: &mut Game, dx: i32) {
        g.cfg.lorenz_steps_per_tick = 0;
        g.cfg.lorenz_angle_deg = 0.0;
        let pos = g.player_pos().unwrap();
        let mut aura = LorenzAura::new(1);
        aura.reset(pos, g.zone);
        aura.points = vec![glam::DVec3::new(dx as f64 / g.cfg.lorenz_scale, 0.0, 25.0)];
        g.lorenz = Some(aura);
    }

    #[test]
    fn starts_with_player_in_zone() {
        let g = game(1);
        let p = g.player().unwrap();
        assert!(p.is_alive());
        assert!(p.actor().unwrap().is_player);
        assert_eq!(g.zone(), ivec3(8, 8, 0));
        assert!(g.log.mentions("Welcome"));
        assert!(g.log.mentions("mysterious lab"));
        assert!(g.level.world.is_visible(p.pos));
    }

    #[test]
    fn refused_actions_cost_nothing() {
        let mut g = game(2);
        clear_zone(&mut g);
        let t = g.now();
        g.queue_player_action(Action::Freeze).unwrap();
        assert_eq!(g.log.last(), Some("You don't know how to do that."));
        assert_eq!(g.now(), t);

        assert!(g.action_by_name("fireball").is_err());
        assert!(g.action_by_name("move").is_err());
        assert_eq!(g.action_by_name("custom_1").unwrap(), Action::Custom(1));
    }

    #[test]
    fn cooldowns_gate_and_expire() {
        let mut g = game(3);
        clear_zone(&mut g);
        let pid = g.player;
        g.player_mut().unwrap().actor_mut().unwrap().actions.push(ActionKind::Destabilize);

        g.queue_player_action(Action::Destabilize).unwrap();
        assert!(g.player().unwrap().cooldown(ActionKind::Destabilize) > 0);
        let t = g.now();
        g.queue_player_action(Action::Destabilize).unwrap();
        assert_eq!(g.log.last(), Some("That ability is recharging."));
        assert_eq!(g.now(), t);

        g.advance(20);
        assert_eq!(g.level.entity(pid).unwrap().cooldown(ActionKind::Destabilize), 0);
    }

    #[test]
    fn butterflies_rest_while_time_stands_still() {
        let mut g = game(5);
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();
        let mut imp = g.make_enemy("imp", pos + ivec2(1, 0)).unwrap();
        if let Some(a) = imp.actor_mut() {
            a.stats.hp = 50;
            a.stats.max_hp = 50;
            a.brain = Brain::Idle;
        }
        let id = g.level.insert(imp);
        pin_butterfly(&mut g, 1);
        let hp = |g: &Game| g.level.entity(id).unwrap().actor().unwrap().stats.hp;

        let t = g.now();
        for _ in 0..30 {
            g.queue_player_action(Action::Look(pos + ivec2(1, 0))).unwrap();
        }
        assert_eq!(g.now(), t);
        assert_eq!(hp(&g), 50);
        assert!(!g.log.mentions("Your butterfly"));

        g.queue_player_action(Action::Wait).unwrap();
        assert!(g.now() > t);
        assert_eq!(hp(&g), 49);
    }

    #[test]
    #[should_panic]
    fn time_never_runs_backwards() {
        let mut g = game(6);
        g.advance(-1);
    }

    #[test]
    fn broken_ai_waits() {
        struct Broken;
        impl Ai for Broken {
            fn choose_action(&self, _: &Game, _: &Level, _: EntityId) -> Result<Action> {
                Err(anyhow!("no thoughts"))
            }
        }

        let mut g = game(4).with_ai(Broken);
        let before: Vec<_> = g.level.actors().map(|e| (e.id, e.pos)).collect();
        g.advance(50);
        let after: Vec<_> = g.level.actors().map(|e| (e.id, e.pos)).collect();
        assert_eq!(before, after);
        // Turns keep coming.
        assert!(g.level.events.len() >= before.len() - 1);
    }

    #[test]
    fn coherence_drain_unravels() {
        let mut g = game(5);
        clear_zone(&mut g);
        g.character.attributes.int = 1;
        let pos = g.player_pos().unwrap();
        let verts: Vec<_> = (0..10).map(|i| glam::dvec2(i as f64, 0.0)).collect();
        g.install_pattern(pos, Pattern::from_graph(verts, vec![]).unwrap());

        // 6 over the budget of 4.
        g.player_stats_mut().unwrap().coherence = 10;
        g.advance(10);
        assert_eq!(g.player_stats().unwrap().coherence, 4);
        g.advance(10);
        assert!(g.level.pattern.is_empty());
        let s = g.player_stats().unwrap();
        assert_eq!(s.coherence, s.max_coherence);
        assert!(g.log.mentions("unravels"));
    }

    #[test]
    fn urgent_queue() {
        let mut g = game(6);
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let s = seen.clone();
        g.set_urgent_callback(move |_| s.set(s.get() + 1));
        g.set_urgent("A", "first", &["Ok"], None);
        g.set_urgent("B", "second", &["Ok"], None);
        assert_eq!(seen.get(), 2);
        assert_eq!(g.urgent().unwrap().title, "A");
        g.resolve_urgent(0).unwrap();
        assert_eq!(g.urgent().unwrap().title, "B");
        g.resolve_urgent(0).unwrap();
        assert!(g.urgent().is_none());
        assert!(g.log.mentions("second"));
    }
}
