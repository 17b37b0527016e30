use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ai::{AbilityInfo, Abilities, AIEnv, CollisionProbe, Movement, Target, Viewport};
use crate::base::{Timedelta, Vec2};
use crate::builder::{GridBuilder, GridConfig, TileLayer, TileMap, LAYER_SOLID, LAYER_WATER};
use crate::error::Result;
use crate::grid::PathingGrid;

//////////////////////////////////////////////////////////////////////////////

// Collision

// Marches along a segment in quarter-tile steps, testing the tile under each
// sample against every layer it was given.
pub struct TileProbe {
    layers: Vec<TileMap>,
}

impl TileProbe {
    pub fn new(layers: Vec<TileMap>) -> Self { Self { layers } }

    fn blocked_on(map: &TileMap, from: Vec2, to: Vec2) -> bool {
        let delta = to - from;
        let steps = (delta.len() / (0.25 * map.tile_width())).ceil().max(1.) as i32;
        (0..=steps).any(|i| {
            let p = from + delta * (i as f64 / steps as f64);
            map.occupied(map.tile_at(p))
        })
    }
}

impl CollisionProbe for TileProbe {
    fn blocked(&self, from: Vec2, to: Vec2, distance: f64) -> bool {
        let delta = to - from;
        let to = if delta.len() > distance { from + delta.normalize_or_zero() * distance } else { to };
        self.layers.iter().any(|x| Self::blocked_on(x, from, to))
    }
}

//////////////////////////////////////////////////////////////////////////////

// Camera

pub struct Camera {
    center: Cell<Vec2>,
    half_extent: Vec2,
}

impl Camera {
    pub fn new(center: Vec2, half_extent: Vec2) -> Self {
        Self { center: Cell::new(center), half_extent }
    }

    pub fn center(&self) -> Vec2 { self.center.get() }

    pub fn move_to(&self, center: Vec2) { self.center.set(center); }
}

impl Viewport for Camera {
    fn contains(&self, point: Vec2, margin: f64) -> bool {
        let Vec2(dx, dy) = point - self.center.get();
        dx.abs() <= self.half_extent.0 + margin && dy.abs() <= self.half_extent.1 + margin
    }
}

//////////////////////////////////////////////////////////////////////////////

// Target

#[derive(Default)]
pub struct TargetCell(Cell<Option<Vec2>>);

impl TargetCell {
    pub fn new(pos: Vec2) -> Self { Self(Cell::new(Some(pos))) }

    pub fn set(&self, pos: Vec2) { self.0.set(Some(pos)); }

    pub fn clear(&self) { self.0.set(None); }
}

impl Target for TargetCell {
    fn position(&self) -> Option<Vec2> { self.0.get() }
}

//////////////////////////////////////////////////////////////////////////////

// Body

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Skill {
    pub range: f64,
    pub cooldown: Timedelta,
}

#[derive(Default)]
struct BodyState {
    pos: Vec2,
    heading: Vec2,
    facing: Vec2,
    speed: f64,
    stunned: bool,
    skills: Vec<(Skill, Timedelta)>,
    used: Vec<(usize, Vec2)>,
    commands: usize,
}

// A point-mass stand-in for a physics body. Handles are shared: the agent
// steers through one, and the simulation integrates and inspects another.
#[derive(Clone, Default)]
pub struct Body(Rc<RefCell<BodyState>>);

impl Body {
    pub fn new(pos: Vec2) -> Self {
        let state = BodyState { pos, ..Default::default() };
        Self(Rc::new(RefCell::new(state)))
    }

    pub fn with_skill(self, range: f64, cooldown: Timedelta) -> Self {
        self.0.borrow_mut().skills.push((Skill { range, cooldown }, Timedelta::default()));
        self
    }

    pub fn pos(&self) -> Vec2 { self.0.borrow().pos }

    pub fn heading(&self) -> Vec2 { self.0.borrow().heading }

    pub fn facing(&self) -> Vec2 { self.0.borrow().facing }

    pub fn speed(&self) -> f64 { self.0.borrow().speed }

    pub fn commands(&self) -> usize { self.0.borrow().commands }

    // (ability index, aim direction) for each ability actually fired.
    pub fn used(&self) -> Vec<(usize, Vec2)> { self.0.borrow().used.clone() }

    pub fn set_pos(&self, pos: Vec2) { self.0.borrow_mut().pos = pos; }

    pub fn set_stunned(&self, stunned: bool) { self.0.borrow_mut().stunned = stunned; }

    // Advances cooldowns, then moves along the current heading. A move into
    // a blocked tile slides along whichever axis is still open.
    pub fn integrate(&self, dt: Timedelta, layers: &[&TileMap]) {
        let mut state = self.0.borrow_mut();
        for (_, left) in &mut state.skills { *left = *left - dt; }

        let step = state.heading * (state.speed * dt.seconds());
        if step == Vec2::ZERO { return; }

        let open = |p: Vec2| layers.iter().all(|x| !x.occupied(x.tile_at(p)));
        let pos = state.pos;
        let options = [pos + step, pos + Vec2(step.0, 0.), pos + Vec2(0., step.1)];
        if let Some(&next) = options.iter().find(|&&x| open(x)) { state.pos = next; }
    }
}

impl Movement for Body {
    fn position(&self) -> Vec2 { self.pos() }

    fn move_toward(&mut self, heading: Vec2, speed: f64) -> bool {
        let mut state = self.0.borrow_mut();
        state.commands += 1;
        if state.stunned { return false; }
        state.heading = heading;
        state.speed = speed;
        true
    }

    fn look_toward(&mut self, direction: Vec2) -> bool {
        let mut state = self.0.borrow_mut();
        state.commands += 1;
        if state.stunned { return false; }
        state.facing = direction.normalize_or_zero();
        true
    }
}

impl Abilities for Body {
    fn usable(&self) -> Vec<AbilityInfo> {
        let state = self.0.borrow();
        if state.stunned { return vec![]; }
        state.skills.iter().enumerate()
            .filter(|(_, (_, left))| !left.is_positive())
            .map(|(index, (skill, _))| AbilityInfo { index, range: skill.range })
            .collect()
    }

    fn use_ability(&mut self, direction: Vec2, index: usize) -> bool {
        let mut state = self.0.borrow_mut();
        state.commands += 1;
        if state.stunned { return false; }
        let Some((skill, left)) = state.skills.get_mut(index) else { return false; };
        if left.is_positive() { return false; }
        *left = skill.cooldown;
        state.used.push((index, direction));
        true
    }
}

//////////////////////////////////////////////////////////////////////////////

// Level

// A parsed ASCII level: its collision layers, the pathing grid sampled from
// them, and the line probe that agents share.
pub struct Level {
    pub solid: TileMap,
    pub water: TileMap,
    pub grid: Rc<PathingGrid>,
    pub probe: Rc<TileProbe>,
}

impl Level {
    pub fn parse(rows: &[&str], config: GridConfig) -> Result<Self> {
        let solid = TileMap::parse(rows, LAYER_SOLID, config.origin, 1.)?;
        let water = TileMap::parse(rows, LAYER_WATER, config.origin, 1.)?;
        let grid = GridBuilder::new(config).layer(&solid).layer(&water).build()?;
        // Anything that blocks movement must block the probe, or agents would
        // chase straight into water they can't cross.
        let probe = TileProbe::new(vec![solid.clone(), water.clone()]);
        Ok(Self { solid, water, grid: Rc::new(grid), probe: Rc::new(probe) })
    }

    pub fn env(&self, body: &Body, target: Rc<dyn Target>, viewport: Rc<dyn Viewport>) -> AIEnv {
        AIEnv {
            grid: Some(self.grid.clone()),
            target,
            probe: self.probe.clone(),
            viewport,
            movement: Box::new(body.clone()),
            abilities: Box::new(body.clone()),
        }
    }

    pub fn integrate(&self, body: &Body, dt: Timedelta) {
        body.integrate(dt, &[&self.solid, &self.water]);
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub const OPEN: [&str; 6] = [
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
    ];

    pub struct Scene {
        pub level: Level,
        pub body: Body,
        pub target: Rc<TargetCell>,
        pub camera: Rc<Camera>,
    }

    impl Scene {
        pub fn new(rows: &[&str], agent: Vec2, target: Vec2, diagonal: bool) -> Self {
            let config = GridConfig { diagonal, ..Default::default() };
            Self {
                level: Level::parse(rows, config).unwrap(),
                body: Body::new(agent),
                target: Rc::new(TargetCell::new(target)),
                camera: Rc::new(Camera::new(agent, Vec2(20., 20.))),
            }
        }

        pub fn env(&self) -> AIEnv {
            self.level.env(&self.body, self.target.clone(), self.camera.clone())
        }
    }

    // An agent three cells from its target on an empty level.
    pub fn open_env() -> (AIEnv, Body) {
        let scene = Scene::new(&OPEN, Vec2(1.5, 1.5), Vec2(4.5, 1.5), false);
        (scene.env(), scene.body)
    }
}
