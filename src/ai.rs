use std::rc::Rc;

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::base::{RNG, Timedelta, Vec2, sample};
use crate::grid::{GridAction, PathingGrid};
use crate::pathing::AStarPath;

//////////////////////////////////////////////////////////////////////////////

// Collaborators

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityInfo {
    pub index: usize,
    pub range: f64,
}

// The agent's body: where it is, and how it accepts steering. Commands
// return false if the body can't act right now (stunned, mid-animation).
pub trait Movement {
    fn position(&self) -> Vec2;
    fn move_toward(&mut self, heading: Vec2, speed: f64) -> bool;
    fn look_toward(&mut self, direction: Vec2) -> bool;
}

pub trait Abilities {
    fn usable(&self) -> Vec<AbilityInfo>;
    fn use_ability(&mut self, direction: Vec2, index: usize) -> bool;
}

// None once the target is gone (dead, despawned, out of the level).
pub trait Target {
    fn position(&self) -> Option<Vec2>;
}

pub trait CollisionProbe {
    fn blocked(&self, from: Vec2, to: Vec2, distance: f64) -> bool;
}

pub trait Viewport {
    fn contains(&self, point: Vec2, margin: f64) -> bool;
}

// Everything an agent talks to, handed over once at spawn time.
pub struct AIEnv {
    pub grid: Option<Rc<PathingGrid>>,
    pub target: Rc<dyn Target>,
    pub probe: Rc<dyn CollisionProbe>,
    pub viewport: Rc<dyn Viewport>,
    pub movement: Box<dyn Movement>,
    pub abilities: Box<dyn Abilities>,
}

//////////////////////////////////////////////////////////////////////////////

// Config

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AIConfig {
    pub aggro_distance: f64,
    pub deaggro: bool,
    pub melee_radius: f64,
    pub aim_offset: f64,
    pub waypoint_buffer: f64,
    pub view_margin: f64,
    pub repath_interval: Timedelta,
    pub ability_interval: Timedelta,
    pub max_iterations: i32,
    pub speed: f64,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            aggro_distance: 10.,
            deaggro: true,
            melee_radius: 1.5,
            aim_offset: 0.25,
            waypoint_buffer: 0.25,
            view_margin: 4.,
            repath_interval: Timedelta::from_seconds(2.),
            ability_interval: Timedelta::from_seconds(5.),
            max_iterations: 1024,
            speed: 1.,
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

// AIState

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Mode { #[default] Idle, Chase, Path, Ability }

pub struct AIState {
    config: AIConfig,
    env: AIEnv,
    mode: Mode,
    rng: RNG,

    // Path following:
    path: Vec<GridAction>,
    cursor: usize,
    waypoint: Option<Vec2>,
    repath_timer: Timedelta,

    // Ability selection:
    selected: Option<AbilityInfo>,
    ability_timer: Timedelta,
}

impl AIState {
    pub fn new(config: AIConfig, env: AIEnv, rng: &mut RNG) -> Self {
        Self {
            config,
            env,
            mode: Mode::Idle,
            rng: RNG::seed_from_u64(rng.gen()),

            path: vec![],
            cursor: 0,
            waypoint: None,
            repath_timer: Timedelta::default(),

            selected: None,
            ability_timer: Timedelta::default(),
        }
    }

    // Getters

    pub fn config(&self) -> &AIConfig { &self.config }

    pub fn mode(&self) -> Mode { self.mode }

    pub fn position(&self) -> Vec2 { self.env.movement.position() }

    pub fn selected_ability(&self) -> Option<AbilityInfo> { self.selected }

    pub fn waypoint(&self) -> Option<Vec2> { self.waypoint }

    // World-space waypoints still ahead of us on the current path.
    pub fn get_path(&self) -> Vec<Vec2> {
        let Some(grid) = &self.env.grid else { return vec![]; };
        let rest = self.path.get(self.cursor..).unwrap_or(&[]);
        rest.iter().map(|x| grid.node_to_world(x.target)).collect()
    }

    // A rebuilt level invalidates any path computed against the old grid.
    pub fn set_grid(&mut self, grid: Option<Rc<PathingGrid>>) {
        self.env.grid = grid;
        self.reset_path();
    }

    // Update

    pub fn tick(&mut self, dt: Timedelta) -> Mode {
        let pos = self.env.movement.position();

        if !self.env.viewport.contains(pos, self.config.view_margin) {
            self.suspend();
            return self.mode;
        }

        let Some(target) = self.env.target.position() else {
            self.transition(Mode::Idle, pos, pos, "target lost");
            return self.mode;
        };

        self.repath_timer = self.repath_timer - dt;
        self.ability_timer = self.ability_timer - dt;
        if !self.ability_timer.is_positive() {
            self.select_ability();
            self.ability_timer = self.config.ability_interval;
        }

        let distance = pos.distance(target);
        let aggro = self.config.aggro_distance;

        if self.mode != Mode::Idle && self.config.deaggro && distance > aggro {
            self.transition(Mode::Idle, pos, target, "out of aggro range");
            return self.mode;
        }

        if self.mode != Mode::Idle || distance <= aggro {
            let (next, reason) = self.decide(pos, target, distance);
            self.transition(next, pos, target, reason);
        }

        self.act(pos, target);
        self.mode
    }

    fn decide(&self, pos: Vec2, target: Vec2, distance: f64) -> (Mode, &'static str) {
        if self.ability_ready(pos, target, distance).is_some() {
            return (Mode::Ability, "ability ready");
        }
        if !self.env.probe.blocked(pos, target, distance) {
            return (Mode::Chase, "clear line to target");
        }
        if self.env.grid.is_none() { return (Mode::Idle, "no grid to path on"); }
        (Mode::Path, "line to target blocked")
    }

    fn transition(&mut self, next: Mode, pos: Vec2, target: Vec2, reason: &'static str) {
        if next == self.mode { return; }
        tracing::debug!(from = ?self.mode, to = ?next, reason, "mode transition");
        let prev = std::mem::replace(&mut self.mode, next);

        // A path is only followed while in Path. Re-entering always replans.
        if prev == Mode::Path { self.reset_path(); }

        match next {
            Mode::Idle => {
                self.reset_path();
                self.halt();
            }
            Mode::Path => self.replan(pos, target),
            Mode::Chase | Mode::Ability => {}
        }
    }

    fn act(&mut self, pos: Vec2, target: Vec2) {
        match self.mode {
            Mode::Idle => {}
            Mode::Chase => self.steer(target - pos),
            Mode::Path => {
                if !self.repath_timer.is_positive() { self.replan(pos, target); }
                let waypoint = self.advance_waypoint(pos, target);
                self.steer(waypoint - pos);
            }
            Mode::Ability => {
                let Some(ability) = self.selected else { return; };
                let aim = self.aim_point(target) - pos;
                if !self.env.abilities.use_ability(aim, ability.index) {
                    tracing::trace!(index = ability.index, "ability use refused");
                }
            }
        }
    }

    // Abilities

    fn aim_point(&self, target: Vec2) -> Vec2 {
        target - Vec2(0., self.config.aim_offset)
    }

    fn ability_ready(&self, pos: Vec2, target: Vec2, distance: f64) -> Option<AbilityInfo> {
        let selected = self.selected?;
        let usable = self.env.abilities.usable();
        let ability = usable.into_iter().find(|x| x.index == selected.index)?;
        if distance > ability.range { return None; }
        if distance <= self.config.melee_radius { return Some(ability); }

        let aim = self.aim_point(target);
        if self.env.probe.blocked(pos, aim, pos.distance(aim)) { return None; }
        Some(ability)
    }

    // Picks a usable ability other than the current one, so that we rotate
    // through our options. Keeps the current one if there's no alternative.
    fn select_ability(&mut self) {
        let current = self.selected.map(|x| x.index);
        let options: Vec<_> = self.env.abilities.usable().into_iter()
            .filter(|x| Some(x.index) != current).collect();
        if options.is_empty() { return; }

        let choice = *sample(&options, &mut self.rng);
        tracing::trace!(index = choice.index, "selected ability");
        self.selected = Some(choice);
    }

    // Path following

    fn replan(&mut self, pos: Vec2, target: Vec2) {
        self.repath_timer = self.config.repath_interval;
        let Some(grid) = &self.env.grid else { return; };

        let path = AStarPath(grid, pos, target, self.config.max_iterations);
        if path.is_empty() { return; }

        self.waypoint = Some(grid.node_to_world(path[0].target));
        self.path = path;
        self.cursor = 0;
    }

    // Returns the point to steer toward this tick, skipping past any
    // waypoints we've already reached. Past the end of the path, that's the
    // target itself.
    fn advance_waypoint(&mut self, pos: Vec2, target: Vec2) -> Vec2 {
        let buffer = self.config.waypoint_buffer;
        loop {
            let next = match (&self.env.grid, self.path.get(self.cursor)) {
                (Some(grid), Some(step)) => grid.node_to_world(step.target),
                _ => target,
            };
            let more = self.cursor < self.path.len();
            if more && pos.distance(next) < buffer {
                self.cursor += 1;
                continue;
            }
            if self.waypoint != Some(next) { tracing::trace!(?next, "next waypoint"); }
            self.waypoint = Some(next);
            return next;
        }
    }

    fn reset_path(&mut self) {
        self.path.clear();
        self.cursor = 0;
        self.waypoint = None;
        self.repath_timer = Timedelta::default();
    }

    // Movement

    fn steer(&mut self, delta: Vec2) {
        let heading = delta.normalize_or_zero();
        let movement = &mut self.env.movement;
        if !movement.move_toward(heading, self.config.speed) {
            tracing::trace!("move command refused");
        }
        if heading != Vec2::ZERO && !movement.look_toward(heading) {
            tracing::trace!("look command refused");
        }
    }

    fn halt(&mut self) {
        if !self.env.movement.move_toward(Vec2::ZERO, 0.) {
            tracing::trace!("halt command refused");
        }
    }

    // Off-screen agents drop everything and do nothing until they're back.
    fn suspend(&mut self) {
        if self.mode != Mode::Idle {
            tracing::debug!(from = ?self.mode, "suspended off-screen");
            self.halt();
        }
        self.mode = Mode::Idle;
        self.reset_path();
        self.selected = None;
        self.ability_timer = Timedelta::default();
    }
}

//////////////////////////////////////////////////////////////////////////////
