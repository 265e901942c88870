//! # Protocol Configuration & Constants
//!
//! Every magic number in the reward protocol lives here. Chain identifiers,
//! fee defaults, wire sizes — if you find one hardcoded somewhere else,
//! that's a bug report waiting to happen.
//!
//! Chain ids follow the LayerZero V2 endpoint-id convention: a small
//! unsigned integer per (chain, environment) pair, assigned by the
//! messaging layer, with no relation to EVM chain ids.

// ---------------------------------------------------------------------------
// Chain Identifiers
// ---------------------------------------------------------------------------

/// A peer chain identifier — the messaging layer's endpoint id for one
/// execution environment. Opaque to this crate beyond equality.
pub type ChainId = u32;

/// Ethereum Sepolia testnet endpoint.
pub const CHAIN_ID_SEPOLIA: ChainId = 40161;

/// Avalanche Fuji testnet endpoint.
pub const CHAIN_ID_FUJI: ChainId = 40106;

/// Polygon Amoy testnet endpoint.
pub const CHAIN_ID_AMOY: ChainId = 40267;

/// Returns a friendly name for a chain id, mainly for logging.
/// Unknown chains get a numeric dump because we don't guess.
pub fn chain_name(chain_id: ChainId) -> String {
    match chain_id {
        CHAIN_ID_SEPOLIA => "sepolia".to_string(),
        CHAIN_ID_FUJI => "fuji".to_string(),
        CHAIN_ID_AMOY => "amoy".to_string(),
        other => format!("chain({other})"),
    }
}

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

/// Size of one wire word: a 256-bit unsigned integer, big-endian.
/// Matches the EVM ABI word size so payloads are `abi.encode`-compatible.
pub const WIRE_WORD_LEN: usize = 32;

/// Total sync payload length: two words, `credential_id` then
/// `points_delta`. Fixed width — no headers, no framing, no surprises.
pub const SYNC_PAYLOAD_LEN: usize = 2 * WIRE_WORD_LEN;

/// Wire protocol version. Bump on any payload layout change; peers on
/// different wire versions must not be configured as each other's peers.
pub const WIRE_PROTOCOL_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Default per-message delivery fee in wei-scale native units: 0.01 native.
/// This is the loopback endpoint's starting quote; real transports price
/// each destination live.
pub const DEFAULT_MESSAGE_FEE: u128 = 10_000_000_000_000_000;

/// Decimal places of the native fee currency. 18, like every EVM chain.
pub const NATIVE_DECIMALS: u8 = 18;
