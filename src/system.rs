//! # Reward System Orchestrator
//!
//! One [`RewardSystem`] instance per chain. It owns that chain's
//! [`RewardLedger`], knows the authorized peer roster, and drives both
//! halves of the sync protocol: the local action path (credit, then
//! broadcast the same delta to every peer) and the inbound path (validate
//! origin, decode, merge).
//!
//! ## Atomicity
//!
//! `perform_action` is all-or-nothing per call. The fee check happens
//! before the local credit, so the common failure — underpayment — commits
//! nothing. If a send still fails afterwards (a live quote can drift above
//! the one taken moments earlier), the local credit is reverted before the
//! error propagates. What can NOT be rolled back is a message the
//! transport already accepted for an earlier destination in the same
//! broadcast; reconciling that remainder is transport-territory, the same
//! as any other delivery anomaly.
//!
//! ## Concurrency model
//!
//! A chain is a serially-ordered execution environment: operations run one
//! at a time to completion, so the ledger needs no lock. Consistency
//! *across* chains is eventual only, guaranteed by the merge being plain
//! addition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{ActionCatalog, ActionKind};
use crate::config::{chain_name, ChainId};
use crate::error::RewardError;
use crate::ledger::RewardLedger;
use crate::registry::{CredentialId, PassportRegistry, NO_CREDENTIAL};
use crate::sync::endpoint::{Endpoint, Fee};
use crate::sync::message::{Origin, PeerAddress, SyncMessage};

// ---------------------------------------------------------------------------
// ActionReceipt
// ---------------------------------------------------------------------------

/// The result of a successful `perform_action` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// The credential that earned the points.
    pub credential_id: CredentialId,
    /// The action that was performed.
    pub action: ActionKind,
    /// Points credited, locally and (eventually) on every peer.
    pub points: u64,
    /// The local balance after the credit.
    pub new_balance: u64,
    /// Total fee consumed across all outbound sends.
    pub fee_spent: Fee,
    /// Number of peer chains the delta was dispatched to.
    pub peers_notified: usize,
}

// ---------------------------------------------------------------------------
// RewardSystem
// ---------------------------------------------------------------------------

/// One chain's view of the cross-chain reward ledger.
///
/// The registry and endpoint are injected at construction — traits, not
/// globals — so the same system runs against a live deployment or the
/// loopback harness without a single line changing.
pub struct RewardSystem<R, E> {
    /// This chain's id. Never a broadcast destination.
    chain_id: ChainId,
    /// The credential registry boundary.
    registry: R,
    /// The messaging layer boundary.
    endpoint: E,
    /// The fixed action-to-points table.
    catalog: ActionCatalog,
    /// The authorized chain set: peer address per chain id. Doubles as
    /// the broadcast fan-out and the inbound origin whitelist.
    peers: BTreeMap<ChainId, PeerAddress>,
    /// The authoritative local point state.
    ledger: RewardLedger,
}

impl<R: PassportRegistry, E: Endpoint> RewardSystem<R, E> {
    /// Creates a reward system for `chain_id` with the given collaborators
    /// and authorized peer roster. An entry for the local chain id in
    /// `peers` is allowed (deployment tooling often configures the full
    /// roster symmetrically) and simply never used as a destination.
    pub fn new(
        chain_id: ChainId,
        registry: R,
        endpoint: E,
        catalog: ActionCatalog,
        peers: impl IntoIterator<Item = (ChainId, PeerAddress)>,
    ) -> Self {
        Self {
            chain_id,
            registry,
            endpoint,
            catalog,
            peers: peers.into_iter().collect(),
            ledger: RewardLedger::new(),
        }
    }

    // -- local action path --------------------------------------------------

    /// Executes a user action: credit the actor's primary credential
    /// locally, then broadcast the same delta to every authorized peer,
    /// paying each destination's quoted fee out of `prepaid_fee`.
    ///
    /// # Errors
    ///
    /// - [`RewardError::NoCredential`] — the actor owns no passport;
    ///   nothing committed, no fee consumed.
    /// - [`RewardError::InsufficientFee`] — `prepaid_fee` does not cover
    ///   the summed quotes; nothing committed.
    /// - Any send failure — the local credit is reverted before the error
    ///   propagates.
    pub fn perform_action(
        &mut self,
        actor: &str,
        kind: ActionKind,
        prepaid_fee: Fee,
    ) -> Result<ActionReceipt, RewardError> {
        let credential_id = self.registry.primary_credential_of(actor);
        if credential_id == NO_CREDENTIAL {
            return Err(RewardError::NoCredential {
                holder: actor.to_string(),
            });
        }

        let points = self.catalog.points_for(kind);
        let payload = SyncMessage::new(credential_id, points).encode();

        // Quote the full broadcast up front so the underpayment path
        // rejects before any state changes.
        let mut planned: Vec<(ChainId, PeerAddress, Fee)> = Vec::new();
        let mut required: Fee = 0;
        for (&dest, &peer) in self.peers.iter() {
            if dest == self.chain_id {
                continue;
            }
            let fee = self.endpoint.quote(dest, &payload)?;
            required = required.saturating_add(fee);
            planned.push((dest, peer, fee));
        }

        if prepaid_fee < required {
            return Err(RewardError::InsufficientFee {
                required,
                provided: prepaid_fee,
            });
        }

        let new_balance = self.ledger.credit(credential_id, points)?;

        for &(dest, peer, fee) in &planned {
            if let Err(e) = self.endpoint.send(dest, peer, &payload, fee) {
                // Keep the call atomic: take the local credit back out
                // before surfacing the transport failure.
                self.ledger.revert_credit(credential_id, points);
                warn!(
                    credential_id,
                    destination = %chain_name(dest),
                    error = %e,
                    "outbound sync failed, local credit reverted"
                );
                return Err(e);
            }
            debug!(
                credential_id,
                destination = %chain_name(dest),
                fee,
                "sync message dispatched"
            );
        }

        info!(
            credential_id,
            action = %kind,
            points,
            new_balance,
            peers = planned.len(),
            "action performed"
        );

        Ok(ActionReceipt {
            credential_id,
            action: kind,
            points,
            new_balance,
            fee_spent: required,
            peers_notified: planned.len(),
        })
    }

    // -- fee quotation ------------------------------------------------------

    /// Quotes the delivery fee for one sync message to one destination.
    /// Pure: no state changes, queryable independently of sending.
    pub fn quote_fee(
        &self,
        destination: ChainId,
        credential_id: CredentialId,
        delta: u64,
    ) -> Result<Fee, RewardError> {
        if !self.peers.contains_key(&destination) || destination == self.chain_id {
            return Err(RewardError::UnknownPeer(destination));
        }
        let payload = SyncMessage::new(credential_id, delta).encode();
        self.endpoint.quote(destination, &payload)
    }

    /// Quotes the total fee for broadcasting one delta to every authorized
    /// peer — what a caller needs to attach to `perform_action`.
    pub fn quote_broadcast(
        &self,
        credential_id: CredentialId,
        delta: u64,
    ) -> Result<Fee, RewardError> {
        let payload = SyncMessage::new(credential_id, delta).encode();
        let mut total: Fee = 0;
        for &dest in self.peers.keys() {
            if dest == self.chain_id {
                continue;
            }
            total = total.saturating_add(self.endpoint.quote(dest, &payload)?);
        }
        Ok(total)
    }

    // -- inbound path -------------------------------------------------------

    /// Applies an inbound sync message: validate the origin against the
    /// peer roster, decode the payload, merge the delta.
    ///
    /// Returns the credential's new local balance. No nonce deduplication
    /// happens here — a message the transport delivers twice is merged
    /// twice, by design.
    ///
    /// # Errors
    ///
    /// - [`RewardError::UnauthorizedOrigin`] — the (chain, sender) pair is
    ///   not a configured peer; the message is dropped.
    /// - [`RewardError::MalformedPayload`] — the payload does not decode;
    ///   the message is dropped. Neither affects prior ledger state.
    pub fn receive(&mut self, origin: &Origin, payload: &[u8]) -> Result<u64, RewardError> {
        match self.peers.get(&origin.source_chain_id) {
            Some(&expected) if expected == origin.sender => {}
            _ => {
                warn!(
                    source = %chain_name(origin.source_chain_id),
                    sender = %origin.sender,
                    "dropping sync message from unauthorized origin"
                );
                return Err(RewardError::UnauthorizedOrigin {
                    chain_id: origin.source_chain_id,
                    sender: origin.sender,
                });
            }
        }

        let message = SyncMessage::decode(payload)?;
        let new_balance = self.ledger.credit(message.credential_id, message.points_delta)?;

        info!(
            credential_id = message.credential_id,
            delta = message.points_delta,
            new_balance,
            source = %chain_name(origin.source_chain_id),
            nonce = origin.nonce,
            "inbound delta merged"
        );

        Ok(new_balance)
    }

    // -- diagnostics --------------------------------------------------------

    /// Returns the local point balance for a credential. Alias of
    /// [`RewardLedger::balance`].
    pub fn total_points(&self, credential_id: CredentialId) -> u64 {
        self.ledger.balance(credential_id)
    }

    /// Returns the holder's primary credential id, or
    /// [`NO_CREDENTIAL`] if they own nothing.
    pub fn primary_credential_of(&self, holder: &str) -> CredentialId {
        self.registry.primary_credential_of(holder)
    }

    /// Read access to the local ledger.
    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// This chain's id.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The authorized chain set, ascending.
    pub fn authorized_chains(&self) -> Vec<ChainId> {
        self.peers.keys().copied().collect()
    }

    /// The configured peer address for a chain, if any.
    pub fn peer_of(&self, chain_id: ChainId) -> Option<PeerAddress> {
        self.peers.get(&chain_id).copied()
    }

    // -- administrative surface ---------------------------------------------
    //
    // Access control for these lives with the external administrative
    // collaborator; the methods themselves just edit the roster.

    /// Adds or replaces a peer in the authorized chain set.
    pub fn set_peer(&mut self, chain_id: ChainId, peer: PeerAddress) {
        self.peers.insert(chain_id, peer);
    }

    /// Removes a peer from the authorized chain set. Subsequent messages
    /// from that chain are rejected as unauthorized.
    pub fn remove_peer(&mut self, chain_id: ChainId) -> Option<PeerAddress> {
        self.peers.remove(&chain_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryPassportRegistry;
    use crate::sync::endpoint::LoopbackEndpoint;
    use std::sync::Arc;

    const CHAIN_A: ChainId = 1;
    const CHAIN_B: ChainId = 2;

    fn addr(byte: u8) -> PeerAddress {
        let mut bytes = [0u8; 32];
        bytes[31] = byte;
        PeerAddress(bytes)
    }

    fn system() -> (
        Arc<InMemoryPassportRegistry>,
        Arc<LoopbackEndpoint>,
        RewardSystem<Arc<InMemoryPassportRegistry>, Arc<LoopbackEndpoint>>,
    ) {
        let registry = Arc::new(InMemoryPassportRegistry::new());
        let endpoint = Arc::new(LoopbackEndpoint::new(CHAIN_A, addr(0xA)));
        endpoint.set_default_fee(100);
        let system = RewardSystem::new(
            CHAIN_A,
            Arc::clone(&registry),
            Arc::clone(&endpoint),
            ActionCatalog::new(),
            [(CHAIN_A, addr(0xA)), (CHAIN_B, addr(0xB))],
        );
        (registry, endpoint, system)
    }

    #[test]
    fn action_without_credential_rejected() {
        let (_registry, endpoint, mut system) = system();

        let result = system.perform_action("nobody", ActionKind::Staking, 1_000);
        assert!(matches!(
            result.unwrap_err(),
            RewardError::NoCredential { .. }
        ));
        assert_eq!(endpoint.pending(), 0);
        assert!(system.ledger().is_empty());
    }

    #[test]
    fn action_credits_and_dispatches() {
        let (registry, endpoint, mut system) = system();
        registry.mint("alice", "ipfs://1");

        let receipt = system
            .perform_action("alice", ActionKind::Farming, 1_000)
            .unwrap();
        assert_eq!(receipt.credential_id, 1);
        assert_eq!(receipt.points, 15);
        assert_eq!(receipt.new_balance, 15);
        assert_eq!(receipt.fee_spent, 100);
        assert_eq!(receipt.peers_notified, 1);

        let deliveries = endpoint.drain();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].destination, CHAIN_B);
        assert_eq!(deliveries[0].peer, addr(0xB));
        assert_eq!(
            SyncMessage::decode(&deliveries[0].payload).unwrap(),
            SyncMessage::new(1, 15)
        );
    }

    #[test]
    fn underpaid_action_commits_nothing() {
        let (registry, endpoint, mut system) = system();
        registry.mint("alice", "ipfs://1");

        let result = system.perform_action("alice", ActionKind::Staking, 99);
        assert!(matches!(
            result.unwrap_err(),
            RewardError::InsufficientFee {
                required: 100,
                provided: 99,
            }
        ));
        assert_eq!(system.total_points(1), 0);
        assert_eq!(endpoint.pending(), 0);
    }

    #[test]
    fn quote_fee_for_known_peer() {
        let (_registry, endpoint, system) = system();
        endpoint.set_fee(CHAIN_B, 250);
        assert_eq!(system.quote_fee(CHAIN_B, 1, 5).unwrap(), 250);
    }

    #[test]
    fn quote_fee_for_unknown_or_local_chain_rejected() {
        let (_registry, _endpoint, system) = system();
        assert!(matches!(
            system.quote_fee(99, 1, 5).unwrap_err(),
            RewardError::UnknownPeer(99)
        ));
        // The local chain is never a destination, even though it sits in
        // the roster.
        assert!(system.quote_fee(CHAIN_A, 1, 5).is_err());
    }

    #[test]
    fn quote_broadcast_sums_destinations() {
        let (_registry, endpoint, mut system) = system();
        system.set_peer(3, addr(0xC));
        endpoint.set_fee(CHAIN_B, 100);
        endpoint.set_fee(3, 40);

        assert_eq!(system.quote_broadcast(1, 5).unwrap(), 140);
    }

    #[test]
    fn receive_from_configured_peer_merges() {
        let (_registry, _endpoint, mut system) = system();

        let origin = Origin {
            source_chain_id: CHAIN_B,
            sender: addr(0xB),
            nonce: 1,
        };
        let payload = SyncMessage::new(1, 5).encode();
        let balance = system.receive(&origin, &payload).unwrap();
        assert_eq!(balance, 5);
        assert_eq!(system.total_points(1), 5);
    }

    #[test]
    fn receive_from_wrong_sender_rejected() {
        let (_registry, _endpoint, mut system) = system();

        let origin = Origin {
            source_chain_id: CHAIN_B,
            sender: addr(0xEE), // not chain B's configured peer
            nonce: 1,
        };
        let payload = SyncMessage::new(1, 5).encode();
        assert!(matches!(
            system.receive(&origin, &payload).unwrap_err(),
            RewardError::UnauthorizedOrigin { chain_id: CHAIN_B, .. }
        ));
        assert_eq!(system.total_points(1), 0);
    }

    #[test]
    fn receive_from_unlisted_chain_rejected() {
        let (_registry, _endpoint, mut system) = system();

        let origin = Origin {
            source_chain_id: 99,
            sender: addr(0xB),
            nonce: 1,
        };
        let payload = SyncMessage::new(1, 5).encode();
        assert!(system.receive(&origin, &payload).is_err());
    }

    #[test]
    fn receive_malformed_payload_rejected() {
        let (_registry, _endpoint, mut system) = system();

        let origin = Origin {
            source_chain_id: CHAIN_B,
            sender: addr(0xB),
            nonce: 1,
        };
        assert!(matches!(
            system.receive(&origin, b"short").unwrap_err(),
            RewardError::MalformedPayload(_)
        ));
        assert!(system.ledger().is_empty());
    }

    #[test]
    fn removed_peer_becomes_unauthorized() {
        let (_registry, _endpoint, mut system) = system();
        assert_eq!(system.remove_peer(CHAIN_B), Some(addr(0xB)));

        let origin = Origin {
            source_chain_id: CHAIN_B,
            sender: addr(0xB),
            nonce: 1,
        };
        let payload = SyncMessage::new(1, 5).encode();
        assert!(system.receive(&origin, &payload).is_err());
    }

    #[test]
    fn roster_accessors() {
        let (_registry, _endpoint, system) = system();
        assert_eq!(system.chain_id(), CHAIN_A);
        assert_eq!(system.authorized_chains(), vec![CHAIN_A, CHAIN_B]);
        assert_eq!(system.peer_of(CHAIN_B), Some(addr(0xB)));
        assert_eq!(system.peer_of(99), None);
    }

    // A transport whose live price is higher than its quote — the drift
    // case that forces the post-credit rollback path.
    struct DriftingEndpoint;

    impl Endpoint for DriftingEndpoint {
        fn quote(&self, _destination: ChainId, _payload: &[u8]) -> Result<Fee, RewardError> {
            Ok(10)
        }

        fn send(
            &self,
            _destination: ChainId,
            _peer: PeerAddress,
            _payload: &[u8],
            fee: Fee,
        ) -> Result<u64, RewardError> {
            Err(RewardError::InsufficientFee {
                required: 20,
                provided: fee,
            })
        }
    }

    #[test]
    fn failed_send_reverts_local_credit() {
        let registry = Arc::new(InMemoryPassportRegistry::new());
        registry.mint("alice", "ipfs://1");
        let mut system = RewardSystem::new(
            CHAIN_A,
            Arc::clone(&registry),
            DriftingEndpoint,
            ActionCatalog::new(),
            [(CHAIN_B, addr(0xB))],
        );

        let result = system.perform_action("alice", ActionKind::Swapping, 1_000);
        assert!(matches!(
            result.unwrap_err(),
            RewardError::InsufficientFee { .. }
        ));
        // The credit that happened before the send was taken back out.
        assert_eq!(system.total_points(1), 0);
    }
}
