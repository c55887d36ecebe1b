//! In-memory ledger implementations
//!
//! The in-process reference ledgers used for development and testing.
//! Durable ledgers live with the surrounding service layer and implement
//! the same traits.

use crate::error::{AllocationError, AllocationResult};
use crate::ledger::traits::{CapacityLedger, OrderLedger};
use crate::types::{Capacity, Order, OrderStatus};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use common::{CapacityId, OrderId};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory order ledger
pub struct InMemoryOrderLedger {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderLedger {
    /// Create a new empty order ledger
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }

    fn lock_poisoned() -> AllocationError {
        AllocationError::Ledger("order ledger lock poisoned".to_string())
    }
}

impl Default for InMemoryOrderLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn create(
        &self,
        region: &str,
        quantity_requested: u32,
        delivery_deadline: NaiveDate,
    ) -> AllocationResult<Order> {
        let order = Order::new(region.to_string(), quantity_requested, delivery_deadline);
        let mut orders = self.orders.write().map_err(|_| Self::lock_poisoned())?;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> AllocationResult<Option<Order>> {
        let orders = self.orders.read().map_err(|_| Self::lock_poisoned())?;
        Ok(orders.get(&id).cloned())
    }

    async fn list_by_status(&self, statuses: &[OrderStatus]) -> AllocationResult<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| Self::lock_poisoned())?;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| statuses.contains(&o.status))
            .cloned()
            .collect();
        // Stable output for deterministic passes
        result.sort_by_key(|o| o.id);
        Ok(result)
    }

    async fn list_by_region(&self, region: &str) -> AllocationResult<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| Self::lock_poisoned())?;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| o.region.eq_ignore_ascii_case(region))
            .cloned()
            .collect();
        result.sort_by_key(|o| o.id);
        Ok(result)
    }

    async fn list_all(&self) -> AllocationResult<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| Self::lock_poisoned())?;
        let mut result: Vec<Order> = orders.values().cloned().collect();
        result.sort_by_key(|o| o.id);
        Ok(result)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> AllocationResult<()> {
        let mut orders = self.orders.write().map_err(|_| Self::lock_poisoned())?;
        let order = orders
            .get_mut(&id)
            .ok_or(AllocationError::OrderNotFound(id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_fulfillment(
        &self,
        id: OrderId,
        quantity_fulfilled: u32,
        status: OrderStatus,
    ) -> AllocationResult<()> {
        let mut orders = self.orders.write().map_err(|_| Self::lock_poisoned())?;
        let order = orders
            .get_mut(&id)
            .ok_or(AllocationError::OrderNotFound(id))?;
        order.quantity_fulfilled = quantity_fulfilled;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory capacity ledger
pub struct InMemoryCapacityLedger {
    capacities: RwLock<HashMap<CapacityId, Capacity>>,
}

impl InMemoryCapacityLedger {
    /// Create a new empty capacity ledger
    pub fn new() -> Self {
        Self {
            capacities: RwLock::new(HashMap::new()),
        }
    }

    fn lock_poisoned() -> AllocationError {
        AllocationError::Ledger("capacity ledger lock poisoned".to_string())
    }
}

impl Default for InMemoryCapacityLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapacityLedger for InMemoryCapacityLedger {
    async fn create(
        &self,
        producer_name: &str,
        quantity_produced: u32,
        production_deadline: NaiveDate,
    ) -> AllocationResult<Capacity> {
        let capacity = Capacity::new(
            producer_name.to_string(),
            quantity_produced,
            production_deadline,
        );
        let mut capacities = self.capacities.write().map_err(|_| Self::lock_poisoned())?;
        capacities.insert(capacity.id, capacity.clone());
        Ok(capacity)
    }

    async fn list_all(&self) -> AllocationResult<Vec<Capacity>> {
        let capacities = self.capacities.read().map_err(|_| Self::lock_poisoned())?;
        let mut result: Vec<Capacity> = capacities.values().cloned().collect();
        result.sort_by_key(|c| c.id);
        Ok(result)
    }

    async fn update_excess(&self, id: CapacityId, excess_quantity: u32) -> AllocationResult<()> {
        let mut capacities = self.capacities.write().map_err(|_| Self::lock_poisoned())?;
        let capacity = capacities
            .get_mut(&id)
            .ok_or(AllocationError::CapacityNotFound(id))?;
        capacity.excess_quantity = excess_quantity;
        capacity.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_order_create_and_get() {
        let ledger = InMemoryOrderLedger::new();
        let order = ledger
            .create("north", 100, date(2025, 6, 10))
            .await
            .unwrap();

        let found = ledger.get(order.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().region, "north");
    }

    #[tokio::test]
    async fn test_order_list_by_status_filters() {
        let ledger = InMemoryOrderLedger::new();
        let a = ledger.create("north", 10, date(2025, 6, 1)).await.unwrap();
        let b = ledger.create("south", 20, date(2025, 6, 2)).await.unwrap();
        ledger
            .update_status(b.id, OrderStatus::Expired)
            .await
            .unwrap();

        let pending = ledger
            .list_by_status(&[OrderStatus::Pending])
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);

        let open = ledger
            .list_by_status(&[OrderStatus::Pending, OrderStatus::Expired])
            .await
            .unwrap();
        assert_eq!(open.len(), 2);
    }

    #[tokio::test]
    async fn test_order_list_by_region_case_insensitive() {
        let ledger = InMemoryOrderLedger::new();
        ledger.create("North", 10, date(2025, 6, 1)).await.unwrap();
        ledger.create("south", 20, date(2025, 6, 2)).await.unwrap();

        let result = ledger.list_by_region("north").await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].region, "North");
    }

    #[tokio::test]
    async fn test_order_update_missing_is_not_found() {
        let ledger = InMemoryOrderLedger::new();
        let err = ledger
            .update_status(OrderId::new(), OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert_matches!(err, AllocationError::OrderNotFound(_));
    }

    #[tokio::test]
    async fn test_order_update_fulfillment() {
        let ledger = InMemoryOrderLedger::new();
        let order = ledger.create("north", 50, date(2025, 6, 1)).await.unwrap();

        ledger
            .update_fulfillment(order.id, 50, OrderStatus::Fulfilled)
            .await
            .unwrap();

        let updated = ledger.get(order.id).await.unwrap().unwrap();
        assert_eq!(updated.quantity_fulfilled, 50);
        assert_eq!(updated.status, OrderStatus::Fulfilled);
    }

    #[tokio::test]
    async fn test_capacity_create_and_list() {
        let ledger = InMemoryCapacityLedger::new();
        let capacity = ledger
            .create("BioPharm", 500, date(2025, 5, 1))
            .await
            .unwrap();
        assert_eq!(capacity.excess_quantity, 500);

        let all = ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, capacity.id);
    }

    #[tokio::test]
    async fn test_capacity_update_excess() {
        let ledger = InMemoryCapacityLedger::new();
        let capacity = ledger
            .create("BioPharm", 500, date(2025, 5, 1))
            .await
            .unwrap();

        ledger.update_excess(capacity.id, 120).await.unwrap();

        let all = ledger.list_all().await.unwrap();
        assert_eq!(all[0].excess_quantity, 120);
    }

    #[tokio::test]
    async fn test_capacity_update_missing_is_not_found() {
        let ledger = InMemoryCapacityLedger::new();
        let err = ledger.update_excess(CapacityId::new(), 10).await.unwrap_err();
        assert_matches!(err, AllocationError::CapacityNotFound(_));
    }
}
