pub mod config;
pub mod dice;
pub mod error;
pub mod sync;
pub mod types;

pub use config::EngineConfig;
pub use error::{CollaboratorError, CombatError, Result};
pub use types::{ActionId, ActorId, ActorKind, Rank, RoomId};
