use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::base::{HashMap, Matrix, Point, Vec2};
use crate::error::{GridError, Result};
use crate::grid::{Costs, Edges, PathingGrid, DIAGONAL_COST, STRAIGHT_COST};

//////////////////////////////////////////////////////////////////////////////

// Tile layers

// A source of static collision geometry: a grid of tiles, each of which is
// either occupied or free, anchored somewhere in world space.
pub trait TileLayer {
    fn origin(&self) -> Vec2;
    fn size(&self) -> Point;
    fn tile_width(&self) -> f64;
    fn occupied(&self, tile: Point) -> bool;
}

pub const LAYER_SOLID: u32 = 1 << 0;
pub const LAYER_WATER: u32 = 1 << 1;

lazy_static! {
    static ref TILES: HashMap<char, u32> = {
        let items = [
            ('#', LAYER_SOLID),
            ('.', 0),
            (' ', 0),
            ('"', 0),
            ('~', LAYER_WATER),
            ('=', 0),
        ];
        items.into_iter().collect()
    };
}

#[derive(Clone)]
pub struct TileMap {
    tiles: Matrix<bool>,
    origin: Vec2,
    tile_width: f64,
}

impl TileMap {
    pub fn new(size: Point, origin: Vec2, tile_width: f64) -> Self {
        Self { tiles: Matrix::new(size, false), origin, tile_width }
    }

    // Reads one collision layer out of an ASCII level: a tile is occupied
    // if its legend flags intersect `mask`.
    pub fn parse(rows: &[&str], mask: u32, origin: Vec2, tile_width: f64) -> Result<Self> {
        check_width(tile_width, GridError::NonPositiveTileWidth)?;
        let expected = rows.first().map(|x| x.chars().count()).unwrap_or(0);
        let size = Point(expected as i32, rows.len() as i32);
        let mut result = Self::new(size, origin, tile_width);

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != expected { return Err(GridError::RaggedMap { row, expected, found }); }

            for (col, ch) in line.chars().enumerate() {
                let Some(&flags) = TILES.get(&ch) else {
                    return Err(GridError::UnknownTile { ch, row, col });
                };
                result.set(Point(col as i32, row as i32), flags & mask != 0);
            }
        }
        Ok(result)
    }

    pub fn set(&mut self, tile: Point, occupied: bool) { self.tiles.set(tile, occupied); }

    // The tile under a world position, which may lie outside the map.
    pub fn tile_at(&self, p: Vec2) -> Point {
        let offset = p - self.origin;
        let x = (offset.0 / self.tile_width).floor() as i32;
        let y = (offset.1 / self.tile_width).floor() as i32;
        Point(x, y)
    }

    pub fn tile_center(&self, tile: Point) -> Vec2 {
        let w = self.tile_width;
        self.origin + Vec2((tile.0 as f64 + 0.5) * w, (tile.1 as f64 + 0.5) * w)
    }
}

impl TileLayer for TileMap {
    fn origin(&self) -> Vec2 { self.origin }
    fn size(&self) -> Point { self.tiles.size }
    fn tile_width(&self) -> f64 { self.tile_width }
    fn occupied(&self, tile: Point) -> bool { self.tiles.get(tile) }
}

// Sampling steps by the width, so it must be usable as a divisor.
fn check_width(width: f64, error: fn(f64) -> GridError) -> Result<()> {
    if width > 0. && width.is_finite() { Ok(()) } else { Err(error(width)) }
}

//////////////////////////////////////////////////////////////////////////////

// GridConfig

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_width: f64,
    pub origin: Vec2,
    // Zero means "cover the first layer".
    pub width: i32,
    pub height: i32,
    pub diagonal: bool,
    pub edge_passability: bool,
    pub straight_cost: i32,
    pub diagonal_cost: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_width: 1.,
            origin: Vec2::ZERO,
            width: 0,
            height: 0,
            diagonal: false,
            edge_passability: true,
            straight_cost: STRAIGHT_COST,
            diagonal_cost: DIAGONAL_COST,
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

// GridBuilder

// Samples static collision layers once, at level load, into a PathingGrid.
// Nothing may search a grid until build() has returned it.
pub struct GridBuilder<'a> {
    config: GridConfig,
    layers: Vec<&'a dyn TileLayer>,
}

#[derive(Clone, Copy, Default)]
struct Blocked { top: bool, bottom: bool, left: bool, right: bool }

impl Blocked {
    fn any(&self) -> bool { self.top || self.bottom || self.left || self.right }
}

impl<'a> GridBuilder<'a> {
    pub fn new(config: GridConfig) -> Self { Self { config, layers: vec![] } }

    pub fn layer(mut self, layer: &'a dyn TileLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(&self) -> Result<PathingGrid> {
        let config = &self.config;
        let w = config.cell_width;
        check_width(w, GridError::NonPositiveCellWidth)?;

        let (straight, diagonal) = (config.straight_cost, config.diagonal_cost);
        if straight <= 0 || diagonal < straight {
            return Err(GridError::InadmissibleCosts { straight, diagonal });
        }
        if config.diagonal && (diagonal as f64) < (straight as f64) * 1.4 {
            tracing::warn!(straight, diagonal,
                           "diagonal cost is below 1.4x straight cost; paths may be suboptimal");
        }

        let first = self.layers.first().ok_or(GridError::NoLayers)?;
        for layer in &self.layers {
            check_width(layer.tile_width(), GridError::NonPositiveTileWidth)?;
        }
        let size = if config.width > 0 && config.height > 0 {
            Point(config.width, config.height)
        } else {
            let extent = |n: i32| (n as f64 * first.tile_width() / w).ceil() as i32;
            Point(extent(first.size().0), extent(first.size().1))
        };
        if size.0 <= 0 || size.1 <= 0 { return Err(GridError::EmptyGrid(size.0, size.1)); }

        let mut edges = Matrix::new(size, Edges::NONE);
        for y in 0..size.1 {
            for x in 0..size.0 {
                let p = Point(x, y);
                let blocked = self.sample_cell(p);
                let open = if config.edge_passability {
                    Edges::new(!blocked.top, !blocked.bottom, !blocked.left, !blocked.right)
                } else {
                    Edges::uniform(!blocked.any())
                };
                edges.set(p, open);
            }
        }

        let costs = Costs { straight, diagonal };
        let grid = PathingGrid::new(&edges, config.origin, w, costs, config.diagonal);
        tracing::debug!(layers = self.layers.len(), "built {:?}", grid);
        Ok(grid)
    }

    // Collects which halves of the cell overlap an occupied tile on any layer.
    fn sample_cell(&self, p: Point) -> Blocked {
        let w = self.config.cell_width;
        let lo = self.config.origin + Vec2(p.0 as f64 * w, p.1 as f64 * w);
        let hi = lo + Vec2(w, w);
        let mid = lo + Vec2(0.5 * w, 0.5 * w);

        let mut result = Blocked::default();
        for layer in &self.layers {
            let tw = layer.tile_width();
            let offset = layer.origin();
            let first = |v: f64, o: f64| ((v - o) / tw).floor() as i32;
            let last = |v: f64, o: f64| ((v - o) / tw).ceil() as i32 - 1;

            for ty in first(lo.1, offset.1)..=last(hi.1, offset.1) {
                for tx in first(lo.0, offset.0)..=last(hi.0, offset.0) {
                    if !layer.occupied(Point(tx, ty)) { continue; }

                    let t0 = offset + Vec2(tx as f64 * tw, ty as f64 * tw);
                    let t1 = t0 + Vec2(tw, tw);
                    result.top |= t0.1 < mid.1;
                    result.bottom |= t1.1 > mid.1;
                    result.left |= t0.0 < mid.0;
                    result.right |= t1.0 > mid.0;
                }
            }
        }
        result
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn build(rows: &[&str], config: GridConfig) -> PathingGrid {
        let solid = TileMap::parse(rows, LAYER_SOLID, Vec2::ZERO, 1.).unwrap();
        GridBuilder::new(config).layer(&solid).build().unwrap()
    }

    #[test]
    fn test_one_tile_per_cell() {
        let grid = build(&[
            "..#",
            ".#.",
            "...",
        ], GridConfig::default());
        assert!(grid.size() == Point(3, 3));
        assert!(!grid.passable(Point(2, 0)));
        assert!(!grid.passable(Point(1, 1)));
        assert!(grid.passable(Point(0, 0)));
        assert!(grid.get(Point(0, 0)).unwrap().edges == Edges::ALL);
        assert!(grid.actions(Point(1, 0)).len() == 1);
    }

    #[test]
    fn test_layers_combine_with_and() {
        let rows = [
            ".~.",
            "#..",
        ];
        let solid = TileMap::parse(&rows, LAYER_SOLID, Vec2::ZERO, 1.).unwrap();
        let water = TileMap::parse(&rows, LAYER_WATER, Vec2::ZERO, 1.).unwrap();

        let grid = GridBuilder::new(GridConfig::default()).layer(&solid).build().unwrap();
        assert!(grid.passable(Point(1, 0)));
        assert!(!grid.passable(Point(0, 1)));

        let grid = GridBuilder::new(GridConfig::default())
            .layer(&solid).layer(&water).build().unwrap();
        assert!(!grid.passable(Point(1, 0)));
        assert!(!grid.passable(Point(0, 1)));
        assert!(grid.passable(Point(2, 0)));
    }

    #[test]
    fn test_partial_cells_keep_open_edges() {
        // Two tiles per cell. The top-left cell has a wall in its top-left
        // quadrant; the top-right cell has a wall along its whole top half.
        let rows = [
            "#.##",
            "....",
            "....",
            "....",
        ];
        let config = GridConfig { cell_width: 2., ..Default::default() };
        let grid = build(&rows, config);
        assert!(grid.size() == Point(2, 2));

        let a = grid.get(Point(0, 0)).unwrap();
        assert!(a.passable());
        assert!(a.edges == Edges::new(false, true, false, true));
        assert!(grid.node_to_world(Point(0, 0)) == Vec2(1.5, 1.5));

        let b = grid.get(Point(1, 0)).unwrap();
        assert!(b.edges == Edges::new(false, true, false, false));
        assert!(grid.node_to_world(Point(1, 0)) == Vec2(3., 1.5));

        assert!(grid.get(Point(0, 1)).unwrap().edges == Edges::ALL);
    }

    #[test]
    fn test_single_flag_mode() {
        let rows = [
            "#...",
            "....",
        ];
        let config = GridConfig { cell_width: 2., edge_passability: false, ..Default::default() };
        let grid = build(&rows, config);
        assert!(!grid.passable(Point(0, 0)));
        assert!(grid.passable(Point(1, 0)));
    }

    #[test]
    fn test_explicit_size_and_origin() {
        let rows = ["..", ".#"];
        let solid = TileMap::parse(&rows, LAYER_SOLID, Vec2(10., 10.), 1.).unwrap();
        let config = GridConfig {
            origin: Vec2(10., 10.), width: 4, height: 3, ..Default::default()
        };
        let grid = GridBuilder::new(config).layer(&solid).build().unwrap();
        assert!(grid.size() == Point(4, 3));
        assert!(!grid.passable(Point(1, 1)));
        assert!(grid.passable(Point(3, 2)));
        assert!(grid.world_to_node(Vec2(11.5, 11.5)) == Point(1, 1));
    }

    #[test]
    fn test_config_errors() {
        let rows = [".."];
        let solid = TileMap::parse(&rows, LAYER_SOLID, Vec2::ZERO, 1.).unwrap();

        let config = GridConfig { cell_width: 0., ..Default::default() };
        let err = GridBuilder::new(config).layer(&solid).build().unwrap_err();
        assert!(err == GridError::NonPositiveCellWidth(0.));

        let config = GridConfig { diagonal_cost: 5, ..Default::default() };
        let err = GridBuilder::new(config).layer(&solid).build().unwrap_err();
        assert!(err == GridError::InadmissibleCosts { straight: 10, diagonal: 5 });

        let err = GridBuilder::new(GridConfig::default()).build().unwrap_err();
        assert!(err == GridError::NoLayers);

        let empty = TileMap::new(Point(0, 0), Vec2::ZERO, 1.);
        let err = GridBuilder::new(GridConfig::default()).layer(&empty).build().unwrap_err();
        assert!(err == GridError::EmptyGrid(0, 0));

        // Layers built by hand skip parse's checks, so build checks them too.
        let config = GridConfig { width: 2, height: 2, ..Default::default() };
        for width in [0., -1., f64::INFINITY] {
            let layer = TileMap::new(Point(2, 2), Vec2::ZERO, width);
            let err = GridBuilder::new(config.clone()).layer(&solid).layer(&layer).build();
            assert!(err.unwrap_err() == GridError::NonPositiveTileWidth(width));
        }
    }

    #[test]
    fn test_parse_errors() {
        let err = TileMap::parse(&["...", ".."], LAYER_SOLID, Vec2::ZERO, 1.).err();
        assert!(err == Some(GridError::RaggedMap { row: 1, expected: 3, found: 2 }));

        let err = TileMap::parse(&["..?"], LAYER_SOLID, Vec2::ZERO, 1.).err();
        assert!(err == Some(GridError::UnknownTile { ch: '?', row: 0, col: 2 }));

        let err = TileMap::parse(&["..", ".."], LAYER_SOLID, Vec2::ZERO, 0.).err();
        assert!(err == Some(GridError::NonPositiveTileWidth(0.)));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: GridConfig = serde_json::from_str(r#"{"diagonal": true}"#).unwrap();
        assert!(config.diagonal);
        assert!(config.cell_width == 1.);
        assert!(config.straight_cost == STRAIGHT_COST);
    }
}
