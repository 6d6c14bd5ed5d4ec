mod agent;
mod camera;
pub mod pathing;

pub use agent::{
    tile_center, Miner, MinerKind, MinerState, MoveIntent, Waypoint, MIN_MINE_COOLDOWN, TILE_SIZE,
};
pub use camera::{CameraCommand, MinerCamera, SWITCH_COOLDOWN};
