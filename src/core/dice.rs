//! Injectable randomness
//!
//! Every random draw in the combat core goes through [`Dice`], so tests can
//! swap the generator for a seeded or fully scripted one.

use std::sync::{Arc, Mutex};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform random values
pub trait Dice: Send {
    /// Uniform value in [0, 1)
    fn unit(&mut self) -> f64;

    /// Uniform value in [low, high]
    fn between(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }

    /// Uniform index in 0..len (len must be > 0)
    fn pick(&mut self, len: usize) -> usize {
        ((self.unit() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

/// Adapter turning any `rand` generator into [`Dice`]
pub struct RngDice<R>(pub R);

impl<R: RngCore + Send> Dice for RngDice<R> {
    fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Dice shared between a component and its timer callbacks
pub type SharedDice = Arc<Mutex<Box<dyn Dice>>>;

pub fn shared(dice: impl Dice + 'static) -> SharedDice {
    Arc::new(Mutex::new(Box::new(dice)))
}

/// Deterministic dice for reproducible runs
pub fn seeded(seed: u64) -> RngDice<ChaCha8Rng> {
    RngDice(ChaCha8Rng::seed_from_u64(seed))
}

/// Dice seeded from the operating system
pub fn from_entropy() -> RngDice<ChaCha8Rng> {
    RngDice(ChaCha8Rng::from_entropy())
}
