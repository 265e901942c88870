//! # Transport Seam
//!
//! The reward protocol does not move bytes between chains — the messaging
//! layer does, for a prepaid fee. [`Endpoint`] is the seam: quote the price
//! of a delivery, then hand over an encoded payload with that price
//! attached. Transport is the caller's problem; keeping the seam this
//! narrow is what lets the whole protocol be tested without a network.
//!
//! [`LoopbackEndpoint`] is the in-process stand-in used by the test
//! harness. It prices messages from a configurable fee table, rejects
//! underpaid sends the way a live endpoint would, and parks accepted
//! messages in an outbox. Tests drain the outbox and deliver by hand —
//! which is exactly the point, because it puts delivery order, duplication,
//! and loss under test control.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ChainId, DEFAULT_MESSAGE_FEE};
use crate::error::RewardError;
use crate::sync::message::{Origin, PeerAddress};

// ---------------------------------------------------------------------------
// Endpoint trait
// ---------------------------------------------------------------------------

/// A prepaid delivery fee in the chain's native value, wei-scale.
pub type Fee = u128;

/// The messaging layer as seen from one chain.
///
/// `quote` must be pure and independently queryable — callers use it to
/// pre-compute the total cost of a broadcast before committing to one.
/// `send` consumes the fee; its failure modes are transport-defined, the
/// canonical one being a fee below the live quote.
pub trait Endpoint {
    /// Returns the exact fee required to deliver `payload` to
    /// `destination`.
    fn quote(&self, destination: ChainId, payload: &[u8]) -> Result<Fee, RewardError>;

    /// Submits `payload` for delivery to `peer` on `destination`, paying
    /// `fee`. Returns the transport-assigned nonce.
    fn send(
        &self,
        destination: ChainId,
        peer: PeerAddress,
        payload: &[u8],
        fee: Fee,
    ) -> Result<u64, RewardError>;
}

impl<T: Endpoint + ?Sized> Endpoint for Arc<T> {
    fn quote(&self, destination: ChainId, payload: &[u8]) -> Result<Fee, RewardError> {
        (**self).quote(destination, payload)
    }

    fn send(
        &self,
        destination: ChainId,
        peer: PeerAddress,
        payload: &[u8],
        fee: Fee,
    ) -> Result<u64, RewardError> {
        (**self).send(destination, peer, payload, fee)
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// One message accepted by the loopback endpoint, waiting for the test
/// harness to carry it to the destination chain's inbound handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// The chain this message is addressed to.
    pub destination: ChainId,
    /// The destination reward system's address.
    pub peer: PeerAddress,
    /// Origin metadata the transport stamps on: source chain, sender,
    /// nonce.
    pub origin: Origin,
    /// The encoded sync payload.
    pub payload: Vec<u8>,
    /// The fee that was paid for this delivery.
    pub fee: Fee,
}

// ---------------------------------------------------------------------------
// LoopbackEndpoint
// ---------------------------------------------------------------------------

/// Fee table and outbox behind the lock.
#[derive(Debug)]
struct EndpointState {
    default_fee: Fee,
    fee_overrides: BTreeMap<ChainId, Fee>,
    /// Next nonce per destination chain. Monotonic from 1.
    nonces: BTreeMap<ChainId, u64>,
    outbox: Vec<Delivery>,
}

/// In-process messaging endpoint for one simulated chain.
///
/// Bound at construction to the local chain id and the local reward
/// system's address — that pair becomes the [`Origin`] of every message it
/// accepts, the same way a live endpoint derives the origin from the
/// calling contract.
#[derive(Debug)]
pub struct LoopbackEndpoint {
    local_chain_id: ChainId,
    local_sender: PeerAddress,
    inner: RwLock<EndpointState>,
}

impl LoopbackEndpoint {
    /// Creates an endpoint for `local_chain_id` whose outbound messages
    /// carry `local_sender` as their origin address. Quotes start at
    /// [`DEFAULT_MESSAGE_FEE`] for every destination.
    pub fn new(local_chain_id: ChainId, local_sender: PeerAddress) -> Self {
        Self {
            local_chain_id,
            local_sender,
            inner: RwLock::new(EndpointState {
                default_fee: DEFAULT_MESSAGE_FEE,
                fee_overrides: BTreeMap::new(),
                nonces: BTreeMap::new(),
                outbox: Vec::new(),
            }),
        }
    }

    /// Sets the fee quoted for every destination without an override.
    pub fn set_default_fee(&self, fee: Fee) {
        self.inner.write().default_fee = fee;
    }

    /// Sets the fee quoted for one specific destination.
    pub fn set_fee(&self, destination: ChainId, fee: Fee) {
        self.inner.write().fee_overrides.insert(destination, fee);
    }

    /// Takes every pending delivery out of the outbox, in acceptance
    /// order. The harness decides what actually happens to them:
    /// delivered once, delivered twice, reordered, or dropped.
    pub fn drain(&self) -> Vec<Delivery> {
        std::mem::take(&mut self.inner.write().outbox)
    }

    /// Returns the number of deliveries waiting in the outbox.
    pub fn pending(&self) -> usize {
        self.inner.read().outbox.len()
    }
}

impl Endpoint for LoopbackEndpoint {
    fn quote(&self, destination: ChainId, _payload: &[u8]) -> Result<Fee, RewardError> {
        let state = self.inner.read();
        Ok(state
            .fee_overrides
            .get(&destination)
            .copied()
            .unwrap_or(state.default_fee))
    }

    fn send(
        &self,
        destination: ChainId,
        peer: PeerAddress,
        payload: &[u8],
        fee: Fee,
    ) -> Result<u64, RewardError> {
        let required = self.quote(destination, payload)?;
        if fee < required {
            return Err(RewardError::InsufficientFee {
                required,
                provided: fee,
            });
        }

        let mut state = self.inner.write();
        let nonce = state.nonces.entry(destination).or_insert(0);
        *nonce += 1;
        let nonce = *nonce;

        state.outbox.push(Delivery {
            destination,
            peer,
            origin: Origin {
                source_chain_id: self.local_chain_id,
                sender: self.local_sender,
                nonce,
            },
            payload: payload.to_vec(),
            fee,
        });

        Ok(nonce)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
