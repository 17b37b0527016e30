use std::rc::Rc;

use rand::SeedableRng;
use serde::Deserialize;

use gridchase::ai::{AIConfig, Mode, Movement};
use gridchase::base::{Point, RNG, Timedelta, Vec2};
use gridchase::builder::GridConfig;
use gridchase::entity::{AID, AgentMap};
use gridchase::world::{Body, Camera, Level, TargetCell};

const LEVEL: [&str; 12] = [
    "########################",
    "#..........#...........#",
    "#..........#...~~~.....#",
    "#....###...#...~~~.....#",
    "#....#.....=...~~~.....#",
    "#....#.....#...........#",
    "#....#######....####...#",
    "#...............#......#",
    "#.....~~~~......#......#",
    "#.....~~~~......#......#",
    "#......................#",
    "########################",
];

const PATROL: [Vec2; 4] = [
    Vec2(20.5, 2.5),
    Vec2(20.5, 9.5),
    Vec2(3.5, 9.5),
    Vec2(8.5, 4.5),
];

#[derive(Deserialize)]
#[serde(default)]
struct DemoConfig {
    grid: GridConfig,
    ai: AIConfig,
    seed: u64,
    ticks: usize,
    dt: Timedelta,
    target_speed: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig { diagonal: true, ..Default::default() },
            ai: AIConfig { speed: 2., ..Default::default() },
            seed: 17,
            ticks: 900,
            dt: Timedelta::from_seconds(1. / 30.),
            target_speed: 1.5,
        }
    }
}

fn load_config() -> anyhow::Result<DemoConfig> {
    let Some(path) = std::env::args().nth(1) else { return Ok(DemoConfig::default()) };
    let text = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&text)?)
}

fn render(level: &Level, target: &Body, agents: &[(AID, Body)]) {
    let cell = |p: Vec2| Point(p.0.floor() as i32, p.1.floor() as i32);
    let mut rows: Vec<Vec<char>> = LEVEL.iter().map(|x| x.chars().collect()).collect();
    let mut mark = |p: Vec2, ch: char| {
        let Point(x, y) = cell(p);
        let slot = rows.get_mut(y as usize).and_then(|row| row.get_mut(x as usize));
        if let Some(slot) = slot { *slot = ch; }
    };
    for (_, body) in agents { mark(body.pos(), 'A'); }
    mark(target.pos(), '@');
    for row in rows { println!("{}", row.into_iter().collect::<String>()); }
    println!("{:?}", level.grid);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let level = Level::parse(&LEVEL, config.grid.clone())?;
    let mut rng = RNG::seed_from_u64(config.seed);

    let quarry = Body::new(Vec2(14.5, 7.5));
    let target = Rc::new(TargetCell::new(quarry.pos()));
    let camera = Rc::new(Camera::new(quarry.pos(), Vec2(12., 8.)));

    let mut agents = AgentMap::default();
    let spawns = [
        (Vec2(2.5, 2.5), Body::new(Vec2(2.5, 2.5)).with_skill(1., Timedelta::from_seconds(1.))),
        (Vec2(19.5, 8.5), Body::new(Vec2(19.5, 8.5))
            .with_skill(1., Timedelta::from_seconds(1.))
            .with_skill(6., Timedelta::from_seconds(3.))),
    ];
    let bodies: Vec<(AID, Body)> = spawns.into_iter().map(|(pos, body)| {
        let env = level.env(&body, target.clone(), camera.clone());
        let aid = agents.spawn(config.ai.clone(), env, &mut rng);
        tracing::info!(?aid, ?pos, "spawned chaser");
        (aid, body)
    }).collect();

    let mut leg = 0;
    for tick in 0..config.ticks {
        let goal = PATROL[leg % PATROL.len()];
        if quarry.pos().distance(goal) < 0.5 { leg += 1; }
        let heading = (goal - quarry.pos()).normalize_or_zero();
        quarry.clone().move_toward(heading, config.target_speed);
        level.integrate(&quarry, config.dt);
        target.set(quarry.pos());
        camera.move_to(quarry.pos());

        agents.tick_all(config.dt);
        for (_, body) in &bodies { level.integrate(body, config.dt); }

        if tick % 30 == 0 {
            tracing::info!(
                tick,
                idle = agents.count(Mode::Idle),
                chase = agents.count(Mode::Chase),
                path = agents.count(Mode::Path),
                ability = agents.count(Mode::Ability),
                "agent modes",
            );
        }
    }

    for (aid, body) in &bodies {
        let Some(ai) = agents.get(*aid) else { continue; };
        println!("{:?}: {:?} at {:?}, {} abilities used",
                 aid, ai.mode(), body.pos(), body.used().len());
    }
    render(&level, &quarry, &bodies);
    Ok(())
}
