use crate::world::tile::{Coord, Direction, Tile};
use smallvec::SmallVec;

/// 8-neighborhood offsets, cardinals first
const NEIGHBORS_8: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (-1, -1),
    (-1, 1),
    (1, 1),
    (1, -1),
];

/// Square tile store, row-major: `tiles[y * size + x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    size: usize,
    tiles: Vec<Tile>,
}

impl TerrainGrid {
    /// Build a grid where every cell comes from `make`.
    pub fn from_fn(size: usize, mut make: impl FnMut(Coord) -> Tile) -> Self {
        let mut tiles = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                tiles.push(make((x, y)));
            }
        }
        Self { size, tiles }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Centre cell, also the spawn point
    pub fn middle(&self) -> Coord {
        (self.size / 2, self.size / 2)
    }

    pub fn in_bounds(&self, (x, y): Coord) -> bool {
        x < self.size && y < self.size
    }

    pub fn get(&self, coord: Coord) -> Option<&Tile> {
        if self.in_bounds(coord) {
            Some(&self.tiles[coord.1 * self.size + coord.0])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Tile> {
        if self.in_bounds(coord) {
            Some(&mut self.tiles[coord.1 * self.size + coord.0])
        } else {
            None
        }
    }

    pub fn is_floor(&self, coord: Coord) -> bool {
        self.get(coord).is_some_and(Tile::is_floor)
    }

    /// In-bounds solid tile
    pub fn is_solid(&self, coord: Coord) -> bool {
        self.get(coord).is_some_and(|tile| !tile.is_floor())
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Step one tile in `dir`, `None` when that leaves the grid.
    pub fn step(&self, (x, y): Coord, dir: Direction) -> Option<Coord> {
        self.offset((x, y), dir.offset())
    }

    fn offset(&self, (x, y): Coord, (dx, dy): (isize, isize)) -> Option<Coord> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.in_bounds((nx, ny)).then_some((nx, ny))
    }

    /// In-bounds cardinal neighbors with the direction that reaches them.
    pub fn cardinal_neighbors(&self, coord: Coord) -> SmallVec<[(Direction, Coord); 4]> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.step(coord, dir).map(|n| (dir, n)))
            .collect()
    }

    /// In-bounds 8-neighborhood.
    pub fn neighbors_8(&self, coord: Coord) -> SmallVec<[Coord; 8]> {
        NEIGHBORS_8
            .into_iter()
            .filter_map(|delta| self.offset(coord, delta))
            .collect()
    }

    /// Count of tiles that are not floor
    pub fn solid_count(&self) -> usize {
        self.tiles.iter().filter(|tile| !tile.is_floor()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TerrainType;

    fn stone_grid(size: usize) -> TerrainGrid {
        TerrainGrid::from_fn(size, |pos| Tile::solid(TerrainType::Stone, 5.0, 1.0, pos))
    }

    #[test]
    fn corner_neighbors_are_bounds_checked() {
        let grid = stone_grid(10);
        assert_eq!(grid.cardinal_neighbors((0, 0)).len(), 2);
        assert_eq!(grid.neighbors_8((0, 0)).len(), 3);
        assert_eq!(grid.neighbors_8((9, 9)).len(), 3);
        assert_eq!(grid.neighbors_8((5, 5)).len(), 8);
        assert!(grid.step((0, 0), Direction::Left).is_none());
        assert!(grid.get((10, 0)).is_none());
    }

    #[test]
    fn tiles_know_their_position() {
        let grid = stone_grid(12);
        assert_eq!(grid.get((7, 3)).map(|t| t.position), Some((7, 3)));
        assert_eq!(grid.middle(), (6, 6));
        assert_eq!(grid.solid_count(), 144);
    }
}
