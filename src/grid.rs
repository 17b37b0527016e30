use thin_vec::ThinVec;

use crate::base::{Matrix, Point, Vec2, dirs};

//////////////////////////////////////////////////////////////////////////////

// Costs

pub const STRAIGHT_COST: i32 = 10;
pub const DIAGONAL_COST: i32 = 14;

//////////////////////////////////////////////////////////////////////////////

// Edges

const EDGE_TOP: u8 = 1 << 0;
const EDGE_BOTTOM: u8 = 1 << 1;
const EDGE_LEFT: u8 = 1 << 2;
const EDGE_RIGHT: u8 = 1 << 3;

// Which sides of a cell are open. "Top" faces -y, like rows in a tile map.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Edges(u8);

impl Edges {
    pub const NONE: Edges = Edges(0);
    pub const ALL: Edges = Edges(EDGE_TOP | EDGE_BOTTOM | EDGE_LEFT | EDGE_RIGHT);

    pub fn new(top: bool, bottom: bool, left: bool, right: bool) -> Self {
        let bit = |x: bool, flag: u8| if x { flag } else { 0 };
        Self(bit(top, EDGE_TOP) | bit(bottom, EDGE_BOTTOM) |
             bit(left, EDGE_LEFT) | bit(right, EDGE_RIGHT))
    }

    pub fn uniform(open: bool) -> Self { if open { Self::ALL } else { Self::NONE } }

    pub fn top(&self) -> bool { self.0 & EDGE_TOP != 0 }
    pub fn bottom(&self) -> bool { self.0 & EDGE_BOTTOM != 0 }
    pub fn left(&self) -> bool { self.0 & EDGE_LEFT != 0 }
    pub fn right(&self) -> bool { self.0 & EDGE_RIGHT != 0 }

    pub fn any(&self) -> bool { self.0 != 0 }

    // Unit offsets toward the open side of each axis, or zero where both or
    // neither side is open.
    pub fn bias(&self) -> Vec2 {
        let axis = |lo: bool, hi: bool| match (lo, hi) {
            (false, true) => 1.,
            (true, false) => -1.,
            _ => 0.,
        };
        Vec2(axis(self.left(), self.right()), axis(self.top(), self.bottom()))
    }
}

//////////////////////////////////////////////////////////////////////////////

// GridNode and GridAction

// A directed edge. The target is a coordinate into the owning grid rather
// than a reference, so the grid stays a plain value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GridAction {
    pub target: Point,
    pub cost: i32,
}

#[derive(Clone, Debug, Default)]
pub struct GridNode {
    pub pos: Point,
    pub edges: Edges,
    pub actions: ThinVec<GridAction>,
}

impl GridNode {
    pub fn passable(&self) -> bool { self.edges.any() }
}

//////////////////////////////////////////////////////////////////////////////

// PathingGrid

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Costs {
    pub straight: i32,
    pub diagonal: i32,
}

impl Default for Costs {
    fn default() -> Self { Self { straight: STRAIGHT_COST, diagonal: DIAGONAL_COST } }
}

// Immutable once built. Levels that change get a new grid.
#[derive(Clone)]
pub struct PathingGrid {
    nodes: Matrix<GridNode>,
    origin: Vec2,
    cell_width: f64,
    costs: Costs,
    diagonal: bool,
}

impl PathingGrid {
    // Wires adjacency for a matrix of cells whose edges are already known.
    pub fn new(edges: &Matrix<Edges>, origin: Vec2, cell_width: f64,
               costs: Costs, diagonal: bool) -> Self {
        let size = edges.size;
        let mut nodes = Matrix::new(size, GridNode::default());
        for y in 0..size.1 {
            for x in 0..size.0 {
                let pos = Point(x, y);
                if let Some(node) = nodes.entry_mut(pos) {
                    node.pos = pos;
                    node.edges = edges.get(pos);
                }
            }
        }

        let passable = |p: Point| edges.contains(p) && edges.get(p).any();
        for y in 0..size.1 {
            for x in 0..size.0 {
                let pos = Point(x, y);
                if !passable(pos) { continue; }

                let mut actions = ThinVec::new();
                for &dir in &dirs::CARDINAL {
                    let target = pos + dir;
                    if passable(target) {
                        actions.push(GridAction { target, cost: costs.straight });
                    }
                }
                if diagonal {
                    for &dir in &dirs::DIAGONAL {
                        let target = pos + dir;
                        if passable(target) {
                            actions.push(GridAction { target, cost: costs.diagonal });
                        }
                    }
                }
                if let Some(node) = nodes.entry_mut(pos) { node.actions = actions; }
            }
        }

        Self { nodes, origin, cell_width, costs, diagonal }
    }

    // Getters

    pub fn width(&self) -> i32 { self.nodes.size.0 }

    pub fn height(&self) -> i32 { self.nodes.size.1 }

    pub fn size(&self) -> Point { self.nodes.size }

    pub fn origin(&self) -> Vec2 { self.origin }

    pub fn cell_width(&self) -> f64 { self.cell_width }

    pub fn costs(&self) -> Costs { self.costs }

    pub fn diagonal(&self) -> bool { self.diagonal }

    pub fn contains(&self, p: Point) -> bool { self.nodes.contains(p) }

    pub fn get(&self, p: Point) -> Option<&GridNode> {
        if !self.contains(p) { return None; }
        Some(self.nodes.entry_ref(p))
    }

    pub fn passable(&self, p: Point) -> bool {
        self.get(p).map(|x| x.passable()).unwrap_or(false)
    }

    pub fn actions(&self, p: Point) -> &[GridAction] {
        self.get(p).map(|x| x.actions.as_slice()).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GridNode> { self.nodes.data.iter() }

    // Coordinate conversion

    // May return a coordinate outside the grid; callers check `contains`.
    pub fn world_to_node(&self, p: Vec2) -> Point {
        let offset = p - self.origin;
        let x = (offset.0 / self.cell_width).floor() as i32;
        let y = (offset.1 / self.cell_width).floor() as i32;
        Point(x, y)
    }

    pub fn node_center(&self, p: Point) -> Vec2 {
        let w = self.cell_width;
        self.origin + Vec2((p.0 as f64 + 0.5) * w, (p.1 as f64 + 0.5) * w)
    }

    // The cell center, pushed a quarter cell toward the open side of a
    // partially blocked cell.
    pub fn node_to_world(&self, p: Point) -> Vec2 {
        let center = self.node_center(p);
        let Some(node) = self.get(p) else { return center; };
        center + node.edges.bias() * (0.25 * self.cell_width)
    }
}

impl std::fmt::Debug for PathingGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self.nodes.data.iter().filter(|x| x.passable()).count();
        write!(f, "PathingGrid({}x{}, {} open, cell {})",
               self.width(), self.height(), open, self.cell_width)
    }
}

//////////////////////////////////////////////////////////////////////////////
