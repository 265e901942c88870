//! # Passport Registry Boundary
//!
//! The registry that maps credential ids to holders is an external
//! collaborator: on a real deployment it lives in its own contract with its
//! own access control, and this crate only ever asks it two questions —
//! "who owns credential X" and "what is holder Y's lowest-numbered
//! credential". [`PassportRegistry`] is that question-asking seam.
//!
//! [`InMemoryPassportRegistry`] is the reference implementation used by the
//! test suites and local tooling. It carries the full credential lifecycle
//! (mint, burn, transfer, metadata URI) so the cross-chain scenarios can
//! exercise ownership changes without a chain underneath.
//!
//! The "primary credential" rule is deliberate: a holder with several
//! passports always accrues points on the lowest-numbered one. Secondary
//! credentials never earn through this path. That is a design decision,
//! not an accident.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::RewardError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A passport credential id. Strictly positive, minted monotonically
/// from 1. Zero is reserved to mean "no credential".
pub type CredentialId = u64;

/// An external holder identity — opaque to this crate, typically a
/// hex-encoded address or public key.
pub type HolderId = String;

/// The reserved "holder owns nothing" sentinel.
pub const NO_CREDENTIAL: CredentialId = 0;

// ---------------------------------------------------------------------------
// PassportRegistry trait
// ---------------------------------------------------------------------------

/// The two queries the reward protocol needs from the credential registry.
///
/// Injected into [`RewardSystem`](crate::system::RewardSystem) at
/// construction — never global state. Implementations are expected to be
/// internally synchronized (`&self` queries), since several reward systems
/// may share one registry view.
pub trait PassportRegistry {
    /// Returns the current holder of a credential, or `None` if the
    /// credential does not exist (never minted, or burned).
    fn owner_of(&self, credential_id: CredentialId) -> Option<HolderId>;

    /// Returns the holder's lowest-numbered credential id, or
    /// [`NO_CREDENTIAL`] if they own nothing.
    fn primary_credential_of(&self, holder: &str) -> CredentialId;
}

impl<T: PassportRegistry + ?Sized> PassportRegistry for Arc<T> {
    fn owner_of(&self, credential_id: CredentialId) -> Option<HolderId> {
        (**self).owner_of(credential_id)
    }

    fn primary_credential_of(&self, holder: &str) -> CredentialId {
        (**self).primary_credential_of(holder)
    }
}

// ---------------------------------------------------------------------------
// InMemoryPassportRegistry
// ---------------------------------------------------------------------------

/// Registry bookkeeping behind the lock.
#[derive(Debug, Default)]
struct RegistryState {
    /// The next credential id to mint. Starts at 1; 0 stays reserved.
    next_id: CredentialId,
    /// Current holder per credential. `BTreeMap` so "lowest owned id"
    /// is the first match in iteration order.
    owners: BTreeMap<CredentialId, HolderId>,
    /// Metadata URI per credential.
    uris: BTreeMap<CredentialId, String>,
}

/// In-memory reference registry with the full credential lifecycle.
///
/// Internally synchronized with a `parking_lot::RwLock` so a single
/// instance can be shared (via `Arc`) across the reward systems of several
/// simulated chains — exactly how the test harness wires it up.
#[derive(Debug)]
pub struct InMemoryPassportRegistry {
    inner: RwLock<RegistryState>,
}

impl InMemoryPassportRegistry {
    /// Creates an empty registry. The first mint yields credential 1.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryState {
                next_id: 1,
                owners: BTreeMap::new(),
                uris: BTreeMap::new(),
            }),
        }
    }

    /// Mints a new credential for `holder` with the given metadata URI and
    /// returns its id. Ids are assigned monotonically and never reused,
    /// even after a burn.
    pub fn mint(&self, holder: impl Into<HolderId>, uri: impl Into<String>) -> CredentialId {
        let mut state = self.inner.write();
        let id = state.next_id;
        state.next_id += 1;
        state.owners.insert(id, holder.into());
        state.uris.insert(id, uri.into());
        id
    }

    /// Burns a credential, removing it from circulation.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::CredentialNotFound`] if it does not exist.
    pub fn burn(&self, credential_id: CredentialId) -> Result<(), RewardError> {
        let mut state = self.inner.write();
        state
            .owners
            .remove(&credential_id)
            .ok_or(RewardError::CredentialNotFound(credential_id))?;
        state.uris.remove(&credential_id);
        Ok(())
    }

    /// Transfers a credential from its current holder to a new one.
    ///
    /// Note what this does NOT touch: reward balances. Points stay bound
    /// to the credential id across ownership changes.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::CredentialNotFound`] if the credential does
    /// not exist, or [`RewardError::NotCredentialOwner`] if `from` is not
    /// its current holder.
    pub fn transfer(
        &self,
        from: &str,
        to: impl Into<HolderId>,
        credential_id: CredentialId,
    ) -> Result<(), RewardError> {
        let mut state = self.inner.write();
        let owner = state
            .owners
            .get_mut(&credential_id)
            .ok_or(RewardError::CredentialNotFound(credential_id))?;

        if owner.as_str() != from {
            return Err(RewardError::NotCredentialOwner {
                credential_id,
                holder: from.to_string(),
            });
        }

        *owner = to.into();
        Ok(())
    }

    /// Returns the metadata URI of a credential.
    pub fn token_uri(&self, credential_id: CredentialId) -> Option<String> {
        self.inner.read().uris.get(&credential_id).cloned()
    }

    /// Replaces the metadata URI of an existing credential.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::CredentialNotFound`] if it does not exist.
    pub fn set_token_uri(
        &self,
        credential_id: CredentialId,
        uri: impl Into<String>,
    ) -> Result<(), RewardError> {
        let mut state = self.inner.write();
        if !state.owners.contains_key(&credential_id) {
            return Err(RewardError::CredentialNotFound(credential_id));
        }
        state.uris.insert(credential_id, uri.into());
        Ok(())
    }

    /// Returns the number of credentials currently in circulation.
    pub fn total_supply(&self) -> usize {
        self.inner.read().owners.len()
    }

    /// Returns all credential ids owned by `holder`, ascending.
    pub fn credentials_of(&self, holder: &str) -> Vec<CredentialId> {
        self.inner
            .read()
            .owners
            .iter()
            .filter(|(_, h)| h.as_str() == holder)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Default for InMemoryPassportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PassportRegistry for InMemoryPassportRegistry {
    fn owner_of(&self, credential_id: CredentialId) -> Option<HolderId> {
        self.inner.read().owners.get(&credential_id).cloned()
    }

    fn primary_credential_of(&self, holder: &str) -> CredentialId {
        // BTreeMap iterates in ascending id order, so the first hit is the
        // lowest-numbered credential.
        self.inner
            .read()
            .owners
            .iter()
            .find(|(_, h)| h.as_str() == holder)
            .map(|(id, _)| *id)
            .unwrap_or(NO_CREDENTIAL)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_assigns_ids_from_one() {
        let registry = InMemoryPassportRegistry::new();
        assert_eq!(registry.mint("alice", "ipfs://1"), 1);
        assert_eq!(registry.mint("bob", "ipfs://2"), 2);
        assert_eq!(registry.owner_of(1).as_deref(), Some("alice"));
        assert_eq!(registry.owner_of(2).as_deref(), Some("bob"));
        assert_eq!(registry.total_supply(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_burn() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("alice", "ipfs://1");
        registry.burn(1).unwrap();
        assert_eq!(registry.mint("bob", "ipfs://2"), 2);
    }

    #[test]
    fn owner_of_unknown_credential_is_none() {
        let registry = InMemoryPassportRegistry::new();
        assert!(registry.owner_of(999).is_none());
    }

    #[test]
    fn primary_credential_is_lowest_owned() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("bob", "ipfs://1"); // id 1, someone else's
        registry.mint("alice", "ipfs://2"); // id 2
        registry.mint("alice", "ipfs://3"); // id 3

        assert_eq!(registry.primary_credential_of("alice"), 2);
    }

    #[test]
    fn primary_credential_of_holderless_is_zero() {
        let registry = InMemoryPassportRegistry::new();
        assert_eq!(registry.primary_credential_of("nobody"), NO_CREDENTIAL);
    }

    #[test]
    fn transfer_changes_owner_and_primary() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("alice", "ipfs://1");

        registry.transfer("alice", "bob", 1).unwrap();
        assert_eq!(registry.owner_of(1).as_deref(), Some("bob"));
        assert_eq!(registry.primary_credential_of("alice"), NO_CREDENTIAL);
        assert_eq!(registry.primary_credential_of("bob"), 1);
    }

    #[test]
    fn transfer_by_non_owner_rejected() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("alice", "ipfs://1");

        let result = registry.transfer("mallory", "bob", 1);
        assert!(matches!(
            result.unwrap_err(),
            RewardError::NotCredentialOwner {
                credential_id: 1,
                ..
            }
        ));
        assert_eq!(registry.owner_of(1).as_deref(), Some("alice"));
    }

    #[test]
    fn transfer_of_unknown_credential_rejected() {
        let registry = InMemoryPassportRegistry::new();
        let result = registry.transfer("alice", "bob", 7);
        assert!(matches!(
            result.unwrap_err(),
            RewardError::CredentialNotFound(7)
        ));
    }

    #[test]
    fn burn_removes_credential() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("alice", "ipfs://1");
        registry.burn(1).unwrap();

        assert!(registry.owner_of(1).is_none());
        assert_eq!(registry.primary_credential_of("alice"), NO_CREDENTIAL);
        assert_eq!(registry.total_supply(), 0);
    }

    #[test]
    fn burn_unknown_credential_rejected() {
        let registry = InMemoryPassportRegistry::new();
        assert!(registry.burn(1).is_err());
    }

    #[test]
    fn token_uri_lifecycle() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("alice", "ipfs://original");
        assert_eq!(registry.token_uri(1).as_deref(), Some("ipfs://original"));

        registry.set_token_uri(1, "ipfs://updated").unwrap();
        assert_eq!(registry.token_uri(1).as_deref(), Some("ipfs://updated"));

        assert!(registry.set_token_uri(999, "ipfs://fail").is_err());
    }

    #[test]
    fn credentials_of_lists_ascending() {
        let registry = InMemoryPassportRegistry::new();
        registry.mint("alice", "ipfs://1");
        registry.mint("bob", "ipfs://2");
        registry.mint("alice", "ipfs://3");

        assert_eq!(registry.credentials_of("alice"), vec![1, 3]);
    }

    #[test]
    fn registry_queries_work_through_arc() {
        let registry = Arc::new(InMemoryPassportRegistry::new());
        registry.mint("alice", "ipfs://1");

        fn primary<R: PassportRegistry>(r: &R, holder: &str) -> CredentialId {
            r.primary_credential_of(holder)
        }

        assert_eq!(primary(&registry, "alice"), 1);
    }
}
