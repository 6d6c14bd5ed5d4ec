use serde::{Deserialize, Serialize};

/// Grid coordinate `(x, y)`; `x` is the column, `y` the row, `(0, 0)` is top-left.
pub type Coord = (usize, usize);

/// What a grid cell is made of.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    /// Walkable, already broken
    Floor,
    /// Tier 0 solid rock, the placeholder for every unrevealed cell
    #[default]
    Stone,
    /// Ore tier, 1 = most common
    Ore(u8),
}

impl TerrainType {
    /// Position on the health/gold curves. Floor has none.
    pub fn tier(self) -> Option<u8> {
        match self {
            TerrainType::Floor => None,
            TerrainType::Stone => Some(0),
            TerrainType::Ore(tier) => Some(tier),
        }
    }

    pub fn is_floor(self) -> bool {
        matches!(self, TerrainType::Floor)
    }

    pub fn is_solid(self) -> bool {
        !self.is_floor()
    }
}

/// A single cell of the terrain grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TerrainType,
    pub health: f64,
    pub max_health: f64,
    /// Gold granted when the tile breaks, fixed when its type was assigned
    pub gold_value: f64,
    pub position: Coord,
    pub destroyed: bool,
}

impl Tile {
    pub fn solid(kind: TerrainType, health: f64, gold_value: f64, position: Coord) -> Self {
        debug_assert!(kind.is_solid());
        Self {
            kind,
            health,
            max_health: health,
            gold_value,
            position,
            destroyed: false,
        }
    }

    pub fn floor(position: Coord) -> Self {
        Self {
            kind: TerrainType::Floor,
            health: 0.0,
            max_health: 0.0,
            gold_value: 0.0,
            position,
            destroyed: true,
        }
    }

    pub fn is_floor(&self) -> bool {
        self.kind.is_floor()
    }

    /// Remaining health in percent. Zero max health (floor) reads as 0 %.
    pub fn health_percent(&self) -> f64 {
        if self.max_health > 0.0 {
            (self.health / self.max_health * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Cardinal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Left, Direction::Down, Direction::Up];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn bit(self) -> u8 {
        match self {
            Direction::Up => 0b0001,
            Direction::Down => 0b0010,
            Direction::Left => 0b0100,
            Direction::Right => 0b1000,
        }
    }
}

/// Set of cardinal directions whose neighbor is still solid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edges(u8);

impl Edges {
    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !dir.bit();
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |dir| self.contains(*dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_tiles_carry_no_health_or_gold() {
        let tile = Tile::floor((3, 4));
        assert!(tile.destroyed);
        assert_eq!(tile.health, 0.0);
        assert_eq!(tile.gold_value, 0.0);
        assert_eq!(tile.health_percent(), 0.0);
    }

    #[test]
    fn health_percent_tracks_damage() {
        let mut tile = Tile::solid(TerrainType::Ore(1), 25.0, 2.5, (0, 0));
        tile.health = 10.0;
        assert!((tile.health_percent() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn edges_insert_and_remove() {
        let mut edges = Edges::default();
        edges.insert(Direction::Up);
        edges.insert(Direction::Left);
        assert!(edges.contains(Direction::Up));
        edges.remove(Direction::Up);
        assert!(!edges.contains(Direction::Up));
        assert_eq!(edges.iter().collect::<Vec<_>>(), vec![Direction::Left]);
        edges.remove(Direction::Left);
        assert!(edges.is_empty());
    }

    #[test]
    fn tiers_and_default() {
        assert_eq!(TerrainType::default(), TerrainType::Stone);
        assert_eq!(TerrainType::Ore(3).tier(), Some(3));
        assert_eq!(TerrainType::Stone.tier(), Some(0));
        assert_eq!(TerrainType::Floor.tier(), None);
    }
}
