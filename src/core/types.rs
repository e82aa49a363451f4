//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Identifier of an actor, as handed out by the character store
///
/// Chat players are keyed by their transport handle, so this is a string
/// rather than a generated id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Unique identifier for an incoming action awaiting a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat room that receives countdowns and outcomes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is behind an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    /// Simulated non-player actor, driven by the auto-responder
    NonPlayer,
}

/// Power rank, weakest first
///
/// The derived ordering follows declaration order, so `Rank::G < Rank::Monarque`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    G,
    F,
    E,
    D,
    C,
    B,
    A,
    S,
    #[serde(rename = "S+")]
    SPlus,
    SS,
    SSS,
    #[serde(rename = "MONARQUE")]
    Monarque,
}

impl Rank {
    pub fn all() -> [Rank; 12] {
        [
            Rank::G,
            Rank::F,
            Rank::E,
            Rank::D,
            Rank::C,
            Rank::B,
            Rank::A,
            Rank::S,
            Rank::SPlus,
            Rank::SS,
            Rank::SSS,
            Rank::Monarque,
        ]
    }

    /// Label used in chat messages
    pub fn label(&self) -> &'static str {
        match self {
            Rank::G => "G",
            Rank::F => "F",
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
            Rank::SPlus => "S+",
            Rank::SS => "SS",
            Rank::SSS => "SSS",
            Rank::Monarque => "MONARQUE",
        }
    }

    /// Time a defender of this rank gets to react to an incoming action
    pub fn reaction_window(&self) -> Duration {
        let ms = match self {
            Rank::G => 360_000,
            Rank::F => 300_000,
            Rank::E => 240_000,
            Rank::D => 180_000,
            Rank::C => 120_000,
            Rank::B => 60_000,
            Rank::A => 30_000,
            Rank::S => 15_000,
            Rank::SPlus => 10_000,
            Rank::SS => 8_000,
            Rank::SSS => 5_000,
            Rank::Monarque => 3_000,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Rank::all()
            .into_iter()
            .find(|rank| rank.label() == upper)
            .ok_or_else(|| format!("unknown rank '{}'", s))
    }
}
