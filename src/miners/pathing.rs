//! Grid searches used by miners.

use crate::world::{Coord, Direction, Terrain};
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};

pub type Chain = SmallVec<[Coord; 8]>;

/// Breadth-first search from `start` through floor tiles to the nearest
/// visible solid tile.
///
/// Returns the steps after `start`; the last step is the solid tile itself.
/// `None` when every reachable floor is enclosed by hidden or no rock.
pub fn path_to_nearest_minable(terrain: &Terrain, start: Coord) -> Option<Vec<Coord>> {
    let grid = terrain.grid();
    if !grid.in_bounds(start) {
        return None;
    }

    let mut came_from: HashMap<Coord, Coord> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    came_from.insert(start, start);

    while let Some(current) = queue.pop_front() {
        for (_, next) in grid.cardinal_neighbors(current) {
            if came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, current);

            if terrain.is_minable(next) {
                return Some(unwind(&came_from, start, next));
            }
            if grid.is_floor(next) {
                queue.push_back(next);
            }
        }
    }
    None
}

fn unwind(came_from: &HashMap<Coord, Coord>, start: Coord, goal: Coord) -> Vec<Coord> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        if previous == start {
            break;
        }
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// Longest run (up to `max_len`) of mutually adjacent visible solid tiles
/// starting at `start`, found by randomized depth-first search with
/// backtracking. Direction order is reshuffled at every step.
///
/// The first element is `start`; empty when `start` itself is not minable.
pub fn longest_chain<R: Rng + ?Sized>(
    terrain: &Terrain,
    start: Coord,
    max_len: usize,
    rng: &mut R,
) -> Chain {
    if max_len == 0 || !terrain.is_minable(start) {
        return Chain::new();
    }

    let mut current = Chain::new();
    current.push(start);
    let mut best = current.clone();
    extend_chain(terrain, &mut current, &mut best, max_len, rng);
    best
}

fn extend_chain<R: Rng + ?Sized>(
    terrain: &Terrain,
    current: &mut Chain,
    best: &mut Chain,
    max_len: usize,
    rng: &mut R,
) {
    if current.len() > best.len() {
        *best = current.clone();
    }
    if best.len() >= max_len {
        return;
    }
    let Some(&head) = current.last() else {
        return;
    };

    let mut directions = Direction::ALL;
    directions.shuffle(rng);
    for dir in directions {
        let Some(next) = terrain.grid().step(head, dir) else {
            continue;
        };
        if !terrain.is_minable(next) || current.contains(&next) {
            continue;
        }
        current.push(next);
        extend_chain(terrain, current, best, max_len, rng);
        current.pop();
        if best.len() >= max_len {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::TerrainTuning;
    use crate::world::{OreModel, TerrainGrid, TerrainType, Tile};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Floor everywhere except `solid`, all of it visible.
    fn open_terrain(size: usize, solid: &[Coord]) -> Terrain {
        let grid = TerrainGrid::from_fn(size, |pos| {
            if solid.contains(&pos) {
                Tile::solid(TerrainType::Ore(1), 25.0, 2.5, pos)
            } else {
                Tile::floor(pos)
            }
        });
        let visible: HashSet<Coord> = grid.tiles().iter().map(|t| t.position).collect();
        Terrain::from_grid(grid, visible, OreModel::new(&TerrainTuning::default()), 2.0)
    }

    #[test]
    fn bfs_finds_nearest_visible_rock() {
        let terrain = open_terrain(10, &[(8, 5), (5, 1)]);
        let path = path_to_nearest_minable(&terrain, (5, 5)).expect("rock is reachable");
        assert_eq!(path.last(), Some(&(8, 5)));
        assert_eq!(path, vec![(6, 5), (7, 5), (8, 5)]);
    }

    #[test]
    fn bfs_ignores_hidden_rock() {
        let grid = TerrainGrid::from_fn(10, |pos| {
            if pos == (7, 5) {
                Tile::solid(TerrainType::Stone, 5.0, 1.0, pos)
            } else {
                Tile::floor(pos)
            }
        });
        let visible: HashSet<Coord> = grid
            .tiles()
            .iter()
            .map(|t| t.position)
            .filter(|pos| *pos != (7, 5))
            .collect();
        let terrain =
            Terrain::from_grid(grid, visible, OreModel::new(&TerrainTuning::default()), 2.0);
        assert!(path_to_nearest_minable(&terrain, (5, 5)).is_none());
    }

    #[test]
    fn bfs_on_fully_broken_grid_returns_none() {
        let terrain = open_terrain(10, &[]);
        assert!(path_to_nearest_minable(&terrain, (0, 0)).is_none());
    }

    #[test]
    fn chain_follows_a_line_and_respects_max_len() {
        let line = [(2, 5), (3, 5), (4, 5), (5, 5), (6, 5), (7, 5)];
        let terrain = open_terrain(10, &line);
        let mut rng = StdRng::seed_from_u64(3);

        let chain = longest_chain(&terrain, (2, 5), 4, &mut rng);
        assert_eq!(chain.as_slice(), &line[..4]);

        let chain = longest_chain(&terrain, (4, 5), 10, &mut rng);
        assert_eq!(chain.len(), 4, "{chain:?}");
        assert_eq!(chain[0], (4, 5));
    }

    #[test]
    fn chain_tiles_are_adjacent_and_unique() {
        let block: Vec<Coord> = (3..6).flat_map(|x| (3..6).map(move |y| (x, y))).collect();
        let terrain = open_terrain(10, &block);
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chain = longest_chain(&terrain, (4, 4), 4, &mut rng);
            assert_eq!(chain.len(), 4);
            for pair in chain.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert_eq!(a.0.abs_diff(b.0) + a.1.abs_diff(b.1), 1);
            }
            let unique: HashSet<_> = chain.iter().collect();
            assert_eq!(unique.len(), chain.len());
        }
    }

    #[test]
    fn chain_from_floor_is_empty() {
        let terrain = open_terrain(10, &[(1, 1)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(longest_chain(&terrain, (5, 5), 4, &mut rng).is_empty());
    }
}
