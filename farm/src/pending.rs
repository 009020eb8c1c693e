//! Pending work units

use rayfarm_net::WorkUnit;
use std::collections::HashMap;

/// Work units not yet completed, offered in round-robin order. A unit is
/// offered again on every pass of the cursor until its result arrives.
#[derive(Clone, Debug, Default)]
pub struct PendingUnits {
    /// Units in offer order, including completed ones not yet compacted.
    units: Vec<WorkUnit>,

    /// Completion flag per entry of `units`.
    done: Vec<bool>,

    /// Position in `units` of every unit still pending.
    index: HashMap<WorkUnit, usize>,

    /// Position of the next unit to offer.
    cursor: usize,
}

impl PendingUnits {
    /// Create the pending set. Duplicate units are kept once.
    ///
    /// * `units` - Units in offer order.
    pub fn new(units: Vec<WorkUnit>) -> Self {
        let mut pending = Self::default();
        for unit in units {
            if !pending.index.contains_key(&unit) {
                pending.index.insert(unit, pending.units.len());
                pending.units.push(unit);
                pending.done.push(false);
            }
        }
        pending
    }

    /// Returns the number of pending units.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true once every unit is complete.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if the unit is still pending.
    pub fn contains(&self, unit: &WorkUnit) -> bool {
        self.index.contains_key(unit)
    }

    /// Returns the unit under the cursor and advances it, wrapping to the
    /// start at the end.
    pub fn next_unit(&mut self) -> Option<WorkUnit> {
        if self.is_empty() {
            return None;
        }
        loop {
            if self.cursor >= self.units.len() {
                self.cursor = 0;
            }
            let i = self.cursor;
            self.cursor += 1;
            if !self.done[i] {
                return Some(self.units[i]);
            }
        }
    }

    /// Mark a unit complete. Returns false if it was not pending.
    ///
    /// * `unit` - The completed unit.
    pub fn complete(&mut self, unit: &WorkUnit) -> bool {
        match self.index.remove(unit) {
            Some(i) => {
                self.done[i] = true;
                if self.index.len() * 2 < self.units.len() {
                    self.compact();
                }
                true
            }
            None => false,
        }
    }

    /// Drop completed entries, keeping the offer order and the cursor
    /// position relative to the remaining units.
    fn compact(&mut self) {
        let cursor = self.done[..self.cursor.min(self.done.len())]
            .iter()
            .filter(|done| !**done)
            .count();

        let units: Vec<WorkUnit> = self
            .units
            .iter()
            .zip(self.done.iter())
            .filter(|(_, done)| !**done)
            .map(|(unit, _)| *unit)
            .collect();

        self.index = units.iter().enumerate().map(|(i, unit)| (*unit, i)).collect();
        self.done = vec![false; units.len()];
        self.units = units;
        self.cursor = cursor;
    }
}
