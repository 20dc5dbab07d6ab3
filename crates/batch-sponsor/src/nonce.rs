//! Per-account monotonic replay counters.

use alloy_primitives::{map::HashMap, Address};
use serde::{Deserialize, Serialize};

/// Per-account replay counters backing authorization validity.
///
/// The counter starts at 0 for a never-used account and only moves forward.
/// Nothing outside the executor's commit path may advance it, and nothing at
/// all may set or decrement it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceStore {
    counters: HashMap<Address, u64>,
}

impl NonceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current nonce for `account`.
    pub fn current(&self, account: Address) -> u64 {
        self.counters.get(&account).copied().unwrap_or_default()
    }

    /// Advances the nonce for `account` by exactly one.
    ///
    /// Called only after a fully committed batch.
    pub(crate) fn advance(&mut self, account: Address) -> u64 {
        let counter = self.counters.entry(account).or_default();
        *counter += 1;
        *counter
    }
}
