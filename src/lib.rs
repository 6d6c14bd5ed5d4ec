//! Idle cave-mining core: procedural caves, lazy ore reveal, autonomous
//! miners and the progression that feeds back into them.

pub mod error;
pub mod miners;
pub mod plugin;
pub mod progression;
pub mod session;
pub mod tuning;
pub mod world;

pub use error::{ConfigError, GameError};
pub use plugin::MiningPlugin;
pub use session::{GameRng, MiningSession, SessionStats};
pub use tuning::GameTuning;
