use thiserror::Error;

use crate::core::types::{ActionId, ActorId};

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("No such actor: {0}")]
    NoSuchActor(ActorId),

    #[error("A reaction window is already open for action {0}")]
    DuplicateAction(ActionId),

    #[error("Unknown action: {0}")]
    UnknownAction(ActionId),

    #[error("Timers need a running tokio runtime")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Failure reported by a character store, notification channel or narrator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("actor {0} is unknown to the character store")]
    UnknownActor(ActorId),

    #[error("notification channel closed")]
    ChannelClosed,

    #[error("{0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Error for a failed actor lookup: an unknown actor is `NoSuchActor`
    pub fn into_lookup_error(self) -> CombatError {
        match self {
            CollaboratorError::UnknownActor(actor) => CombatError::NoSuchActor(actor),
            other => CombatError::Collaborator(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CombatError>;
