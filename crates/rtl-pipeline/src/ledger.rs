//! Per-unit content hashes observed across incremental passes, and the RTL
//! names written so far.

use std::collections::{HashMap, HashSet};

use crate::unit::UnitId;

/// Last content hash seen for each unit during one watch session.
///
/// Starts empty when the plugin is constructed, lives as long as the plugin,
/// and is never persisted.
#[derive(Debug, Default, Clone)]
pub struct UnitHashLedger {
    seen: HashMap<UnitId, String>,
    outputs: HashSet<String>,
}

impl UnitHashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash` for `unit`, returning whether it differs from the last
    /// recorded value. Units never seen before always count as changed.
    pub fn observe(&mut self, unit: &UnitId, hash: &str) -> bool {
        match self.seen.get_mut(unit) {
            Some(previous) if previous == hash => false,
            Some(previous) => {
                *previous = hash.to_string();
                true
            }
            None => {
                self.seen.insert(unit.clone(), hash.to_string());
                true
            }
        }
    }

    pub fn last(&self, unit: &UnitId) -> Option<&str> {
        self.seen.get(unit).map(String::as_str)
    }

    /// Remember `name` as an RTL output of this plugin.
    pub fn record_output(&mut self, name: impl Into<String>) {
        self.outputs.insert(name.into());
    }

    /// Whether `name` was written as an RTL output in an earlier pass.
    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.contains(name)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
