//! Engine event types and the downstream notification seam
//!
//! Collaborators that want to hear about completed passes and sweeps attach
//! a [`PassListener`]. Delivery is best-effort and at-least-once: listener
//! failures are logged and never affect ledger state, and re-delivery is
//! safe because engine operations are idempotent with respect to terminal
//! records.

use crate::error::AllocationResult;
use crate::result::PassTrigger;
use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};

/// Event emitted by the allocation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationEvent {
    /// An allocation pass committed its plan
    PassCompleted {
        /// What triggered the pass
        trigger: PassTrigger,
        /// Orders transitioned to fulfilled
        orders_fulfilled: Vec<OrderId>,
        /// Total doses committed
        doses_allocated: u32,
        /// Uncommitted excess remaining after the pass
        leftover_total: u32,
    },

    /// An expiry sweep transitioned overdue orders
    OrdersExpired {
        /// Orders transitioned to expired
        order_ids: Vec<OrderId>,
    },
}

/// Downstream listener for engine events
#[async_trait]
pub trait PassListener: Send + Sync {
    /// Handle one engine event. Errors are logged by the engine and do not
    /// affect ledger state.
    async fn on_event(&self, event: &AllocationEvent) -> AllocationResult<()>;
}

/// Default listener: emits events to the log
pub struct LogListener;

#[async_trait]
impl PassListener for LogListener {
    async fn on_event(&self, event: &AllocationEvent) -> AllocationResult<()> {
        match event {
            AllocationEvent::PassCompleted {
                trigger,
                orders_fulfilled,
                doses_allocated,
                leftover_total,
            } => {
                tracing::info!(
                    %trigger,
                    orders_fulfilled = orders_fulfilled.len(),
                    doses_allocated,
                    leftover_total,
                    "Allocation pass completed"
                );
            }
            AllocationEvent::OrdersExpired { order_ids } => {
                tracing::info!(orders_expired = order_ids.len(), "Expiry sweep completed");
            }
        }
        Ok(())
    }
}
