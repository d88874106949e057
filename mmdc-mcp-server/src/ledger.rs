//! Per-fingerprint render attempt accounting.
//!
//! [`AttemptLedger`] is an explicitly owned value: the server context holds
//! one for the process lifetime and tests build their own. Entries are never
//! evicted; the map grows with the number of distinct sources that have been
//! attempted without a success or an exhausted budget.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::fingerprint::Fingerprint;

/// Returned by [`AttemptLedger::check_and_reserve`] once a fingerprint has
/// used its whole budget. The entry has already been purged when this is
/// returned, so the next identical request starts again at attempt 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Maximum retry attempts ({max_attempts}) reached")]
pub struct BudgetExhausted {
    /// Attempts recorded when the budget ran out.
    pub attempts: u32,
    pub max_attempts: u32,
}

/// Fingerprint → attempt count, guarded by a single lock so the threshold
/// check and the increment happen together.
#[derive(Debug, Default)]
pub struct AttemptLedger {
    entries: Mutex<HashMap<Fingerprint, u32>>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next attempt for `fingerprint`.
    ///
    /// Returns the 1-based attempt number, or [`BudgetExhausted`] (and removes
    /// the entry) when `max_attempts` attempts are already recorded.
    pub fn check_and_reserve(
        &self,
        fingerprint: &Fingerprint,
        max_attempts: u32,
    ) -> Result<u32, BudgetExhausted> {
        let mut entries = self.entries.lock();
        let current = entries.get(fingerprint).copied().unwrap_or(0);
        if current >= max_attempts {
            entries.remove(fingerprint);
            return Err(BudgetExhausted {
                attempts: current,
                max_attempts,
            });
        }
        let next = current + 1;
        entries.insert(fingerprint.clone(), next);
        Ok(next)
    }

    /// Forget `fingerprint`. Called after a verified success.
    pub fn reset(&self, fingerprint: &Fingerprint) {
        self.entries.lock().remove(fingerprint);
    }

    /// Attempts currently recorded for `fingerprint` (0 when absent).
    pub fn attempts(&self, fingerprint: &Fingerprint) -> u32 {
        self.entries.lock().get(fingerprint).copied().unwrap_or(0)
    }

    /// Number of fingerprints being tracked.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
