//! # Reward Ledger
//!
//! Per-chain, add-only point accounting keyed by credential id. This is the
//! authoritative local state — every other chain's view of the same
//! credential converges to the same number because the only mutation is
//! addition, and addition doesn't care what order the deltas arrive in.
//!
//! Entries are created lazily on first credit and never deleted. Balances
//! never decrease through the public API: no debits, no resets, no
//! transfers. A credential changing hands leaves its points exactly where
//! they were — points are bound to the credential id, not the holder.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RewardError;
use crate::registry::CredentialId;

// ---------------------------------------------------------------------------
// PointsEntry
// ---------------------------------------------------------------------------

/// A single credential's accumulated points on this chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntry {
    /// Accumulated points. Only ever goes up.
    pub points: u64,
    /// Timestamp of the last credit, local or inbound.
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RewardLedger
// ---------------------------------------------------------------------------

/// The per-chain mapping from credential id to accumulated points.
///
/// The merge operation is plain addition — commutative and associative —
/// so the final balance is independent of the interleaving between local
/// actions and inbound sync deltas. That property is what makes eventual
/// consistency across chains achievable without any ordering guarantees
/// from the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardLedger {
    /// Point entries indexed by credential id.
    entries: HashMap<CredentialId, PointsEntry>,
}

impl RewardLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Credits `delta` points to a credential, creating the entry if absent.
    ///
    /// Returns the new balance. Both the local-action path and the
    /// inbound-sync path funnel through here; neither gets special
    /// treatment, which is exactly why their relative order doesn't matter.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::BalanceOverflow`] if the credit would exceed
    /// `u64::MAX`. The entry is left untouched in that case.
    pub fn credit(
        &mut self,
        credential_id: CredentialId,
        delta: u64,
    ) -> Result<u64, RewardError> {
        let entry = self
            .entries
            .entry(credential_id)
            .or_insert_with(|| PointsEntry {
                points: 0,
                last_updated: Utc::now(),
            });

        let new_points =
            entry
                .points
                .checked_add(delta)
                .ok_or(RewardError::BalanceOverflow {
                    credential_id,
                    current: entry.points,
                    delta,
                })?;

        entry.points = new_points;
        entry.last_updated = Utc::now();

        Ok(new_points)
    }

    /// Reverses a credit that was part of an action whose broadcast failed.
    ///
    /// Crate-internal on purpose: the public surface never decreases a
    /// balance. This exists solely so `perform_action` can keep its
    /// local-credit-plus-broadcast transactional boundary.
    pub(crate) fn revert_credit(&mut self, credential_id: CredentialId, delta: u64) {
        if let Some(entry) = self.entries.get_mut(&credential_id) {
            entry.points = entry.points.saturating_sub(delta);
            entry.last_updated = Utc::now();
        }
    }

    /// Returns the current balance for a credential, 0 if never credited.
    pub fn balance(&self, credential_id: CredentialId) -> u64 {
        self.entries
            .get(&credential_id)
            .map(|e| e.points)
            .unwrap_or(0)
    }

    /// Returns the full entry for a credential, including the last-updated
    /// timestamp, or `None` if it was never credited.
    pub fn entry(&self, credential_id: CredentialId) -> Option<&PointsEntry> {
        self.entries.get(&credential_id)
    }

    /// Returns all non-zero balances as `(credential_id, points)` pairs,
    /// in no particular order.
    pub fn all_balances(&self) -> Vec<(CredentialId, u64)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.points > 0)
            .map(|(id, e)| (*id, e.points))
            .collect()
    }

    /// Returns the number of credentials that have ever been credited.
    pub fn credited_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no credential has ever been credited.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_creates_entry_lazily() {
        let mut ledger = RewardLedger::new();
        assert_eq!(ledger.balance(1), 0);

        let balance = ledger.credit(1, 5).unwrap();
        assert_eq!(balance, 5);
        assert_eq!(ledger.balance(1), 5);
        assert_eq!(ledger.credited_count(), 1);
    }

    #[test]
    fn credit_accumulates() {
        let mut ledger = RewardLedger::new();
        ledger.credit(1, 5).unwrap();
        ledger.credit(1, 10).unwrap();
        assert_eq!(ledger.balance(1), 15);
    }

    #[test]
    fn merge_order_independence() {
        // The core consistency property: D1 then D2 equals D2 then D1.
        let mut forward = RewardLedger::new();
        forward.credit(1, 5).unwrap();
        forward.credit(1, 20).unwrap();

        let mut reverse = RewardLedger::new();
        reverse.credit(1, 20).unwrap();
        reverse.credit(1, 5).unwrap();

        assert_eq!(forward.balance(1), reverse.balance(1));
    }

    #[test]
    fn unknown_credential_reads_zero() {
        let ledger = RewardLedger::new();
        assert_eq!(ledger.balance(999), 0);
        assert!(ledger.entry(999).is_none());
    }

    #[test]
    fn credit_overflow_rejected_and_entry_untouched() {
        let mut ledger = RewardLedger::new();
        ledger.credit(1, u64::MAX).unwrap();

        let result = ledger.credit(1, 1);
        assert!(matches!(
            result.unwrap_err(),
            RewardError::BalanceOverflow {
                credential_id: 1,
                current: u64::MAX,
                delta: 1,
            }
        ));
        assert_eq!(ledger.balance(1), u64::MAX);
    }

    #[test]
    fn revert_credit_undoes_a_single_credit() {
        let mut ledger = RewardLedger::new();
        ledger.credit(1, 5).unwrap();
        ledger.credit(1, 10).unwrap();

        ledger.revert_credit(1, 10);
        assert_eq!(ledger.balance(1), 5);
    }

    #[test]
    fn revert_credit_on_unknown_credential_is_noop() {
        let mut ledger = RewardLedger::new();
        ledger.revert_credit(42, 100);
        assert_eq!(ledger.balance(42), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn all_balances_excludes_zero_entries() {
        let mut ledger = RewardLedger::new();
        ledger.credit(1, 5).unwrap();
        ledger.credit(2, 10).unwrap();
        ledger.revert_credit(2, 10);

        let balances = ledger.all_balances();
        assert_eq!(balances, vec![(1, 5)]);
    }

    #[test]
    fn independent_credentials_do_not_interfere() {
        let mut ledger = RewardLedger::new();
        ledger.credit(1, 5).unwrap();
        ledger.credit(2, 20).unwrap();

        assert_eq!(ledger.balance(1), 5);
        assert_eq!(ledger.balance(2), 20);
        assert_eq!(ledger.credited_count(), 2);
    }

    #[test]
    fn ledger_serialization_roundtrip() {
        let mut ledger = RewardLedger::new();
        ledger.credit(1, 42).unwrap();

        let json = serde_json::to_string(&ledger).expect("serialize");
        let recovered: RewardLedger = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.balance(1), 42);
    }
}
