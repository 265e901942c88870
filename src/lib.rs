// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Passport Rewards — Cross-Chain Reward Ledger
//!
//! A reward-point ledger for holders of a unique digital credential (a
//! "passport"), kept numerically consistent across several independent
//! chains that can only talk through an asynchronous, fee-metered
//! messaging layer. No shared clock, no shared memory, no ordering
//! guarantees — just messages that eventually arrive, possibly more than
//! once.
//!
//! The trick that makes this workable: the ledger merge is plain addition.
//! Addition is commutative and associative, so the final balance on every
//! chain is independent of the order (and interleaving) in which local
//! actions and remote deltas land. Eventual consistency falls out of
//! arithmetic instead of coordination.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns:
//!
//! - **catalog** — The fixed action-to-points table. Leaf data.
//! - **ledger** — Per-chain, add-only point accounting per credential.
//! - **registry** — The passport registry boundary: who owns what.
//! - **sync** — The cross-chain protocol: wire codec, transport seam,
//!   and the loopback endpoint used for testing.
//! - **system** — The [`RewardSystem`] orchestrator that ties one chain's
//!   ledger to its authorized peers.
//! - **config** — Protocol constants and chain identifiers.
//!
//! ## What this crate deliberately does NOT do
//!
//! - No exactly-once delivery. A duplicated inbound message double-credits.
//!   That boundary belongs to the transport, and pretending otherwise here
//!   would just hide the gap.
//! - No cross-chain message ordering, no consensus, no finality. Those are
//!   properties of the underlying chains.
//! - No balance decreases. Points only go up.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod registry;
pub mod sync;
pub mod system;

mod error;

pub use catalog::{ActionCatalog, ActionKind};
pub use config::ChainId;
pub use error::RewardError;
pub use ledger::RewardLedger;
pub use registry::{
    CredentialId, HolderId, InMemoryPassportRegistry, PassportRegistry, NO_CREDENTIAL,
};
pub use sync::endpoint::{Delivery, Endpoint, Fee, LoopbackEndpoint};
pub use sync::message::{Origin, PeerAddress, SyncMessage};
pub use system::{ActionReceipt, RewardSystem};
