//! # Action Catalog
//!
//! The fixed table mapping an action kind to its point value. This is leaf
//! data: configured once at construction, immutable for the lifetime of the
//! instance, consulted by [`RewardSystem`](crate::system::RewardSystem) on
//! every local action.
//!
//! The action set is a closed enum, not a runtime-extensible collection.
//! Adding a new action kind is a protocol change and should look like one:
//! a new variant, a new default value, and a wire-compatible rollout across
//! every chain in the roster.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The kinds of user action that earn reward points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Locking tokens for yield.
    Staking,
    /// Holding through a vesting schedule.
    Vesting,
    /// Providing liquidity.
    Farming,
    /// Executing a swap.
    Swapping,
}

impl ActionKind {
    /// All action kinds, in catalog order.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Staking,
        ActionKind::Vesting,
        ActionKind::Farming,
        ActionKind::Swapping,
    ];

    /// The protocol-default point value for this action.
    pub const fn default_points(self) -> u64 {
        match self {
            ActionKind::Staking => 5,
            ActionKind::Vesting => 10,
            ActionKind::Farming => 15,
            ActionKind::Swapping => 20,
        }
    }

    /// Dense index into the catalog table.
    const fn index(self) -> usize {
        match self {
            ActionKind::Staking => 0,
            ActionKind::Vesting => 1,
            ActionKind::Farming => 2,
            ActionKind::Swapping => 3,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Staking => write!(f, "staking"),
            ActionKind::Vesting => write!(f, "vesting"),
            ActionKind::Farming => write!(f, "farming"),
            ActionKind::Swapping => write!(f, "swapping"),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionCatalog
// ---------------------------------------------------------------------------

/// The point table itself: one value per [`ActionKind`].
///
/// Immutable after construction. Deployments that want non-default values
/// build the table with [`with_points`](Self::with_points) before wiring it
/// into the reward system; there is deliberately no setter afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCatalog {
    /// Point values indexed by `ActionKind::index()`.
    points: [u64; 4],
}

impl ActionCatalog {
    /// Creates the catalog with the protocol-default point values
    /// (5 / 10 / 15 / 20).
    pub fn new() -> Self {
        let mut points = [0u64; 4];
        for kind in ActionKind::ALL {
            points[kind.index()] = kind.default_points();
        }
        Self { points }
    }

    /// Creates a catalog with explicit point values, in [`ActionKind::ALL`]
    /// order. For deployments that tune the reward curve.
    pub fn with_points(points: [u64; 4]) -> Self {
        Self { points }
    }

    /// Returns the point value for an action kind.
    pub fn points_for(&self, kind: ActionKind) -> u64 {
        self.points[kind.index()]
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
