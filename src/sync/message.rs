//! # Sync Messages and the Wire Codec
//!
//! A sync message carries one point delta from the chain where the action
//! happened to every other chain in the roster: "credential N earned D
//! points, merge it". The value itself is two fields; everything else —
//! source chain, sender address, nonce — is origin metadata stamped on by
//! the transport, not by this crate.
//!
//! ## Wire Format
//!
//! The payload is a fixed 64 bytes: two 256-bit big-endian unsigned words,
//! `credential_id` first, `points_delta` second. That is byte-for-byte the
//! EVM `abi.encode(uint256, uint256)` of the same tuple, so EVM peers can
//! decode it with a single `abi.decode` and no custom parsing.
//!
//! Rust-side values are `u64`. On decode, the upper 24 bytes of each word
//! must be zero — a peer claiming a delta beyond `u64::MAX` is either
//! corrupt or hostile, and either way the message is dropped as malformed.

use serde::{Deserialize, Serialize};

use crate::config::{ChainId, SYNC_PAYLOAD_LEN, WIRE_WORD_LEN};
use crate::error::RewardError;
use crate::registry::CredentialId;

// ---------------------------------------------------------------------------
// PeerAddress
// ---------------------------------------------------------------------------

/// A 32-byte transport-level address identifying a reward system instance
/// on one chain. EVM deployments zero-pad their 20-byte contract address
/// into the low bytes, matching the messaging layer's peer format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddress(pub [u8; 32]);

impl PeerAddress {
    /// The all-zero address. Not a valid peer; useful as a placeholder in
    /// tests and for detecting unconfigured slots.
    pub const ZERO: PeerAddress = PeerAddress([0u8; 32]);

    /// Parses a peer address from a hex string (with or without `0x`),
    /// left-padding with zeros to 32 bytes — the same convention as
    /// zero-padding an EVM address into a `bytes32` peer slot.
    pub fn from_hex(s: &str) -> Result<Self, RewardError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s)
            .map_err(|e| RewardError::MalformedPayload(format!("bad peer address hex: {e}")))?;
        if raw.len() > 32 {
            return Err(RewardError::MalformedPayload(format!(
                "peer address too long: {} bytes",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - raw.len()..].copy_from_slice(&raw);
        Ok(PeerAddress(bytes))
    }
}

impl std::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PeerAddress({self})")
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Transport-supplied metadata describing where an inbound message came
/// from. The inbound handler trusts none of it until the (chain, sender)
/// pair matches the configured peer roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// The chain the message claims to come from.
    pub source_chain_id: ChainId,
    /// The sending reward system's address on that chain.
    pub sender: PeerAddress,
    /// Transport-assigned message nonce. Carried for diagnostics only —
    /// this crate performs no nonce-based deduplication.
    pub nonce: u64,
}

// ---------------------------------------------------------------------------
// SyncMessage
// ---------------------------------------------------------------------------

/// The cross-chain point delta: immutable once constructed, encoded to the
/// wire on send, decoded and merged on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// The credential being credited.
    pub credential_id: CredentialId,
    /// The point increment to merge into the peer's ledger.
    pub points_delta: u64,
}

impl SyncMessage {
    /// Creates a sync message.
    pub fn new(credential_id: CredentialId, points_delta: u64) -> Self {
        Self {
            credential_id,
            points_delta,
        }
    }

    /// Encodes the message as two big-endian 256-bit words.
    pub fn encode(&self) -> [u8; SYNC_PAYLOAD_LEN] {
        let mut payload = [0u8; SYNC_PAYLOAD_LEN];
        write_word(&mut payload[..WIRE_WORD_LEN], self.credential_id);
        write_word(&mut payload[WIRE_WORD_LEN..], self.points_delta);
        payload
    }

    /// Decodes a wire payload back into a message.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::MalformedPayload`] if the payload is not
    /// exactly [`SYNC_PAYLOAD_LEN`] bytes, or if either word exceeds
    /// `u64::MAX`.
    pub fn decode(payload: &[u8]) -> Result<Self, RewardError> {
        if payload.len() != SYNC_PAYLOAD_LEN {
            return Err(RewardError::MalformedPayload(format!(
                "expected {SYNC_PAYLOAD_LEN} bytes, got {}",
                payload.len()
            )));
        }

        let credential_id = read_word(&payload[..WIRE_WORD_LEN], "credential_id")?;
        let points_delta = read_word(&payload[WIRE_WORD_LEN..], "points_delta")?;

        Ok(Self {
            credential_id,
            points_delta,
        })
    }
}

/// Writes `value` into a 32-byte word, big-endian, upper bytes zero.
fn write_word(word: &mut [u8], value: u64) {
    word[WIRE_WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
}

/// Reads a 32-byte big-endian word, rejecting values beyond `u64::MAX`.
fn read_word(word: &[u8], field: &str) -> Result<u64, RewardError> {
    if word[..WIRE_WORD_LEN - 8].iter().any(|&b| b != 0) {
        return Err(RewardError::MalformedPayload(format!(
            "{field} exceeds u64 range"
        )));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&word[WIRE_WORD_LEN - 8..]);
    Ok(u64::from_be_bytes(raw))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
