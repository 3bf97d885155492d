//! Settle-once cell
//!
//! A run can be resolved from two places: the render task when it finishes
//! and the watchdog when the run is too old. Both write into the same
//! [`Settlement`]; the first write wins and later writes are rejected.

use std::sync::OnceLock;

/// Holds the first value written to it
#[derive(Debug)]
pub struct Settlement<T> {
    cell: OnceLock<T>,
}

impl<T> Settlement<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Stores `value` unless the cell is already settled
    ///
    /// Returns the rejected value when another writer got there first.
    pub fn settle(&self, value: T) -> Result<(), T> {
        self.cell.set(value)
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T> Default for Settlement<T> {
    fn default() -> Self {
        Self::new()
    }
}
