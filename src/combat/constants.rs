//! Combat tables - all fixed per-rank values in one place
//!
//! Rank windows live on [`Rank`] itself; severity durations on
//! `FailureSeverity`. These are the remaining rank-indexed tables.

use crate::core::types::Rank;

/// Failure chance added when acting against an opponent of this rank
///
/// Small on purpose: even a MONARQUE adds at most 0.30.
pub fn opponent_modifier(rank: Rank) -> f64 {
    match rank {
        Rank::G => 0.0,
        Rank::F => 0.02,
        Rank::E => 0.04,
        Rank::D => 0.06,
        Rank::C => 0.08,
        Rank::B => 0.10,
        Rank::A => 0.12,
        Rank::S => 0.15,
        Rank::SPlus => 0.18,
        Rank::SS => 0.22,
        Rank::SSS => 0.25,
        Rank::Monarque => 0.30,
    }
}

/// Damage of a fully effective NPC counter-reaction
pub fn npc_base_damage(rank: Rank) -> f64 {
    match rank {
        Rank::G => 8.0,
        Rank::F => 12.0,
        Rank::E => 16.0,
        Rank::D => 22.0,
        Rank::C => 28.0,
        Rank::B => 36.0,
        Rank::A => 45.0,
        Rank::S => 55.0,
        Rank::SPlus => 65.0,
        Rank::SS => 78.0,
        Rank::SSS => 90.0,
        Rank::Monarque => 120.0,
    }
}

/// Chance an NPC counter-reaction is flagged as potentially lethal
pub fn npc_lethal_chance(rank: Rank) -> f64 {
    match rank {
        Rank::G => 0.0,
        Rank::F => 0.02,
        Rank::E => 0.05,
        Rank::D => 0.08,
        Rank::C => 0.12,
        Rank::B => 0.16,
        Rank::A => 0.22,
        Rank::S => 0.30,
        Rank::SPlus => 0.38,
        Rank::SS => 0.46,
        Rank::SSS => 0.55,
        Rank::Monarque => 0.70,
    }
}
