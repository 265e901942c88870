//! # Cross-Chain Sync Protocol
//!
//! The protocol that keeps every chain's reward ledger converging on the
//! same numbers, split along its two natural halves:
//!
//! ```text
//!  Chain A                                          Chain B
//!  ────────                                         ────────
//!  perform_action
//!    │ credit local ledger
//!    │ encode {credential, delta}       ...eventually, unordered,
//!    │ quote + pay fee per peer            possibly duplicated...
//!    └──► Endpoint::send ──────────────────────► receive(origin, payload)
//!                                                  │ origin in roster?
//!                                                  │ payload decodes?
//!                                                  └─ credit local ledger
//! ```
//!
//! ### Outbound (`message.rs` + the system's action path)
//! Encode the delta into the fixed 64-byte wire format, quote the delivery
//! price per destination, and hand the payload to the [`Endpoint`] with
//! the fee attached.
//!
//! ### Inbound (`message.rs` + the system's receive path)
//! Validate the origin against the authorized peer roster, decode, merge.
//! A bad message is dropped and affects nothing else.
//!
//! ### What the transport owes us — and what it doesn't
//! Delivery is assumed at-least-once and unordered. This module performs
//! no nonce deduplication: a message delivered twice is merged twice.
//! The merge being plain addition makes reordering harmless; duplication
//! is a documented consistency boundary the transport is expected to
//! minimize.

pub mod endpoint;
pub mod message;

pub use endpoint::{Delivery, Endpoint, Fee, LoopbackEndpoint};
pub use message::{Origin, PeerAddress, SyncMessage};
