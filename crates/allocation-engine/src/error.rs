//! Allocation engine error types

use common::{CapacityId, OrderId};
use thiserror::Error;

/// Errors that can occur in the allocation engine and its ledgers
#[derive(Error, Debug)]
pub enum AllocationError {
    /// Input rejected before any ledger mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Capacity not found
    #[error("Capacity not found: {0}")]
    CapacityNotFound(CapacityId),

    /// Status transition not permitted
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// An allocation commit applied some writes but not all of them.
    /// Already-applied writes are individually consistent and are not
    /// rolled back; callers retry the failed records.
    #[error("Partial commit: {} record(s) committed, {} failed ({})",
        committed.len(), failed.len(), failed.join(", "))]
    PartialCommitFailure {
        committed: Vec<String>,
        failed: Vec<String>,
    },

    /// Ledger storage error
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for allocation operations
pub type AllocationResult<T> = std::result::Result<T, AllocationError>;
