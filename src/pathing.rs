use crate::base::{LOS, Point, Vec2};
use crate::grid::{GridAction, PathingGrid};
use crate::search::{AStar, SearchProblem};

//////////////////////////////////////////////////////////////////////////////

// Constants

// How far, in cells, to look for an open cell when an endpoint lands on a
// blocked one (an agent hugging a wall, a target standing in a doorway).
const SNAP_RADIUS: i32 = 2;

//////////////////////////////////////////////////////////////////////////////

// GridSearch

// Binds the generic A* engine to a PathingGrid: states are node coordinates,
// actions are the grid's precomputed edges.
pub struct GridSearch<'a> {
    grid: &'a PathingGrid,
    source: Point,
    target: Point,
}

impl<'a> GridSearch<'a> {
    pub fn new(grid: &'a PathingGrid, source: Point, target: Point) -> Self {
        Self { grid, source, target }
    }

    // Endpoints are the nodes under the two world positions, snapped to a
    // nearby open node if needed. None if either has no open node nearby.
    pub fn between(grid: &'a PathingGrid, source: Vec2, target: Vec2) -> Option<Self> {
        let source = snap(grid, grid.world_to_node(source))?;
        let target = snap(grid, grid.world_to_node(target))?;
        Some(Self::new(grid, source, target))
    }

    pub fn source(&self) -> Point { self.source }

    pub fn target(&self) -> Point { self.target }
}

impl<'a> SearchProblem for GridSearch<'a> {
    type State = Point;
    type Action = GridAction;

    fn start(&self) -> Point { self.source }

    fn is_goal(&self, state: Point) -> bool { state == self.target }

    fn successors(&self, state: Point) -> Vec<(GridAction, Point)> {
        // The builder never wires an edge into a blocked node; check anyway.
        self.grid.actions(state).iter()
            .filter(|x| self.grid.passable(x.target))
            .map(|&x| (x, x.target))
            .collect()
    }

    fn cost(&self, action: &GridAction) -> i32 { action.cost }

    // Manhattan distance for 4-way grids. For 8-way grids, |dx - dy| scaled
    // by the straight cost: a cheap octile approximation that ignores the
    // diagonal leg entirely. It never overestimates, but it is much weaker
    // than true octile distance, and it was tuned against a 10 / 14 cost
    // pair; revisit it together with the cost constants.
    fn heuristic(&self, state: Point) -> i32 {
        let Point(dx, dy) = state - self.target;
        let (dx, dy) = (dx.abs(), dy.abs());
        let straight = self.grid.costs().straight;
        if self.grid.diagonal() { (dx - dy).abs() * straight } else { (dx + dy) * straight }
    }
}

fn snap(grid: &PathingGrid, p: Point) -> Option<Point> {
    if grid.passable(p) { return Some(p); }
    for radius in 1..=SNAP_RADIUS {
        let mut best: Option<(i32, Point)> = None;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let delta = Point(dx, dy);
                if delta.len_l1() != radius { continue; }
                let q = p + delta;
                if !grid.passable(q) { continue; }
                let score = delta.len_taxicab();
                if best.map_or(true, |(s, _)| score < s) { best = Some((score, q)); }
            }
        }
        if let Some((_, q)) = best { return Some(q); }
    }
    None
}

//////////////////////////////////////////////////////////////////////////////

// Path queries

// A* between two world positions. Empty if there's no path, if either
// endpoint has no open node nearby, or if both map to the same node.
#[allow(non_snake_case)]
pub fn AStarPath(grid: &PathingGrid, source: Vec2, target: Vec2,
                 max_iterations: i32) -> Vec<GridAction> {
    let Some(problem) = GridSearch::between(grid, source, target) else {
        tracing::debug!(?source, ?target, "no open node near a path endpoint");
        return vec![];
    };
    let path = AStar(&problem, max_iterations);
    if path.is_empty() && problem.source() != problem.target() {
        tracing::debug!(from = ?problem.source(), to = ?problem.target(), "no path found");
    }
    path
}

// Like AStarPath, but first tries the straight grid line between the two
// nodes. If every node on it is open, and each step is a wired edge, we walk
// it without searching.
pub fn find_path(grid: &PathingGrid, source: Vec2, target: Vec2,
                 max_iterations: i32) -> Vec<GridAction> {
    let Some(problem) = GridSearch::between(grid, source, target) else { return vec![]; };

    let los = LOS(problem.source(), problem.target());
    let mut direct = Vec::with_capacity(los.len());
    for pair in los.windows(2) {
        let step = grid.actions(pair[0]).iter().find(|x| x.target == pair[1]);
        let Some(&step) = step else { break; };
        direct.push(step);
    }
    if direct.len() + 1 == los.len() { return direct; }

    AStar(&problem, max_iterations)
}

//////////////////////////////////////////////////////////////////////////////
