//! Lock helpers shared by the keyed stores

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a table, recovering the data if a callback panicked while holding it
///
/// Every table mutation is a single read-modify-write, so a poisoned guard
/// still holds consistent data.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
