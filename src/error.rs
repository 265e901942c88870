//! Error types for the reward protocol.
//!
//! Every fallible operation in this crate returns a [`RewardError`]. The
//! enum is exhaustive over the failure modes of the local action path, the
//! inbound sync path, and the registry boundary.
//!
//! Propagation policy: failures on the local action path abort the entire
//! call with nothing committed. Inbound failures drop that single message
//! and never touch prior ledger state.

use thiserror::Error;

use crate::config::ChainId;
use crate::registry::CredentialId;
use crate::sync::message::PeerAddress;

/// Errors that can occur in the reward ledger and its sync protocol.
#[derive(Debug, Error)]
pub enum RewardError {
    /// The actor holds no passport credential; the action is rejected
    /// before any state changes or fees are consumed.
    #[error("no credential: holder {holder} owns no passport")]
    NoCredential {
        /// The holder that attempted the action.
        holder: String,
    },

    /// The caller-supplied payment does not cover the full broadcast cost.
    /// The whole action is rejected — local credit and outbound sends are
    /// atomic.
    #[error("insufficient fee: required {required}, provided {provided}")]
    InsufficientFee {
        /// Total fee required across all destinations.
        required: u128,
        /// What the caller actually attached.
        provided: u128,
    },

    /// An inbound message arrived from a chain or sender address that is
    /// not the configured peer. The message is dropped.
    #[error("unauthorized origin: chain {chain_id}, sender {sender}")]
    UnauthorizedOrigin {
        /// The claimed source chain id.
        chain_id: ChainId,
        /// The claimed sender address.
        sender: PeerAddress,
    },

    /// An inbound payload failed to decode. Fatal to this message only.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Crediting would overflow the stored balance. If you're hitting
    /// this, someone is minting more than 18.4 quintillion points.
    #[error("balance overflow: credential {credential_id}, current {current}, delta {delta}")]
    BalanceOverflow {
        /// The credential being credited.
        credential_id: CredentialId,
        /// The balance before the failed credit.
        current: u64,
        /// The delta that caused the overflow.
        delta: u64,
    },

    /// A send or quote targeted a chain with no configured peer address.
    #[error("unknown peer: chain {0} is not in the authorized chain set")]
    UnknownPeer(ChainId),

    /// The referenced credential does not exist in the registry.
    #[error("credential not found: {0}")]
    CredentialNotFound(CredentialId),

    /// A registry operation was attempted by someone other than the
    /// credential's current holder.
    #[error("holder {holder} does not own credential {credential_id}")]
    NotCredentialOwner {
        /// The credential in question.
        credential_id: CredentialId,
        /// The holder that attempted the operation.
        holder: String,
    },
}
