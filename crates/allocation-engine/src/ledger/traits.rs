//! Order and capacity ledger trait definitions

use crate::error::AllocationResult;
use crate::types::{Capacity, Order, OrderStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CapacityId, OrderId};

/// Durable store of demand records.
///
/// The ledger assigns record identifiers; the engine never constructs an
/// order id itself.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Create a new pending order and assign it an id
    async fn create(
        &self,
        region: &str,
        quantity_requested: u32,
        delivery_deadline: NaiveDate,
    ) -> AllocationResult<Order>;

    /// Get an order by id
    ///
    /// # Returns
    /// The order if found, None otherwise
    async fn get(&self, id: OrderId) -> AllocationResult<Option<Order>>;

    /// List orders in any of the given statuses
    async fn list_by_status(&self, statuses: &[OrderStatus]) -> AllocationResult<Vec<Order>>;

    /// List orders for a region (case-insensitive match)
    async fn list_by_region(&self, region: &str) -> AllocationResult<Vec<Order>>;

    /// List every order in the ledger
    async fn list_all(&self) -> AllocationResult<Vec<Order>>;

    /// Update an order's status
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> AllocationResult<()>;

    /// Update an order's fulfilled quantity and status in one write
    async fn update_fulfillment(
        &self,
        id: OrderId,
        quantity_fulfilled: u32,
        status: OrderStatus,
    ) -> AllocationResult<()>;
}

/// Durable store of supply batches.
#[async_trait]
pub trait CapacityLedger: Send + Sync {
    /// Register a new batch; a fresh batch starts fully unallocated
    async fn create(
        &self,
        producer_name: &str,
        quantity_produced: u32,
        production_deadline: NaiveDate,
    ) -> AllocationResult<Capacity>;

    /// List every batch in the ledger
    async fn list_all(&self) -> AllocationResult<Vec<Capacity>>;

    /// Update a batch's uncommitted excess
    async fn update_excess(&self, id: CapacityId, excess_quantity: u32) -> AllocationResult<()>;
}
