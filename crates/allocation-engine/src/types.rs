//! Allocation engine domain types
//!
//! This module defines the demand (`Order`) and supply (`Capacity`) records
//! the engine allocates between.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CapacityId, OrderId};
use serde::{Deserialize, Serialize};

/// Status of a demand order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order created, waiting for supply
    Pending,
    /// Expired order promoted by an operator; served before pending demand
    Priority,
    /// Order fully covered by an allocation pass
    Fulfilled,
    /// Delivery deadline passed while still pending
    Expired,
    /// Order cancelled by an operator
    Cancelled,
}

impl OrderStatus {
    /// Terminal states can never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }

    /// Open orders participate in allocation passes
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Priority)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Priority => write!(f, "priority"),
            OrderStatus::Fulfilled => write!(f, "fulfilled"),
            OrderStatus::Expired => write!(f, "expired"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Demand record: a regional request for doses by a delivery deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier (assigned by the order ledger)
    pub id: OrderId,
    /// Requesting region
    pub region: String,
    /// Total doses requested (immutable after creation)
    pub quantity_requested: u32,
    /// Doses already committed to this order
    pub quantity_fulfilled: u32,
    /// Current order status
    pub status: OrderStatus,
    /// Promised delivery date
    pub delivery_deadline: NaiveDate,
    /// Order creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order
    pub fn new(region: String, quantity_requested: u32, delivery_deadline: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            region,
            quantity_requested,
            quantity_fulfilled: 0,
            status: OrderStatus::Pending,
            delivery_deadline,
            created_at: now,
            updated_at: now,
        }
    }

    /// Doses still needed to complete this order
    pub fn remaining(&self) -> u32 {
        self.quantity_requested.saturating_sub(self.quantity_fulfilled)
    }

    /// Whether the delivery deadline has passed as of the given date
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.delivery_deadline < as_of
    }

    /// Any non-fulfilled order can be cancelled
    pub fn can_cancel(&self) -> bool {
        self.status != OrderStatus::Fulfilled
    }
}

/// Supply record: a produced batch with a production deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capacity {
    /// Unique capacity identifier (assigned by the capacity ledger)
    pub id: CapacityId,
    /// Producer that registered the batch
    pub producer_name: String,
    /// Total doses in the batch (immutable after creation)
    pub quantity_produced: u32,
    /// Doses not yet committed to any order
    pub excess_quantity: u32,
    /// Date by which the batch is guaranteed available
    pub production_deadline: NaiveDate,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Capacity {
    /// Create a new capacity; a fresh batch is entirely unallocated
    pub fn new(producer_name: String, quantity_produced: u32, production_deadline: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: CapacityId::new(),
            producer_name,
            quantity_produced,
            excess_quantity: quantity_produced,
            production_deadline,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an unpersisted batch backing a budget-capped fulfillment
    /// request. Supply on hand is available as of the given date, so it is
    /// eligible for every order promised strictly after it.
    pub fn synthetic(quantity: u32, available_on: NaiveDate) -> Self {
        Self::new("<budget>".to_string(), quantity, available_on)
    }

    /// Draw doses from the batch. Returns the amount actually drawn,
    /// never taking the excess below zero.
    pub fn draw(&mut self, amount: u32) -> u32 {
        let drawn = amount.min(self.excess_quantity);
        self.excess_quantity -= drawn;
        drawn
    }

    /// Whether the batch has no uncommitted doses left
    pub fn is_exhausted(&self) -> bool {
        self.excess_quantity == 0
    }

    /// A batch is eligible for an order only if it completes production
    /// strictly before the order's promised delivery date.
    pub fn is_eligible_for(&self, delivery_deadline: NaiveDate) -> bool {
        self.production_deadline < delivery_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_order_new() {
        let order = Order::new("north".to_string(), 100, date(2025, 6, 10));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.quantity_fulfilled, 0);
        assert_eq!(order.remaining(), 100);
    }

    #[test]
    fn test_order_overdue_is_strict() {
        let order = Order::new("north".to_string(), 10, date(2025, 1, 1));
        assert!(!order.is_overdue(date(2025, 1, 1)));
        assert!(order.is_overdue(date(2025, 1, 2)));
    }

    #[test]
    fn test_order_can_cancel() {
        let mut order = Order::new("north".to_string(), 10, date(2025, 1, 1));
        assert!(order.can_cancel());

        order.status = OrderStatus::Expired;
        assert!(order.can_cancel());

        order.status = OrderStatus::Fulfilled;
        assert!(!order.can_cancel());
    }

    #[test]
    fn test_status_predicates() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Priority.is_open());
        assert!(!OrderStatus::Expired.is_open());
        assert!(OrderStatus::Fulfilled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Expired.is_terminal());
    }

    #[test]
    fn test_capacity_starts_unallocated() {
        let capacity = Capacity::new("BioPharm".to_string(), 500, date(2025, 5, 1));
        assert_eq!(capacity.excess_quantity, 500);
        assert!(!capacity.is_exhausted());
    }

    #[test]
    fn test_capacity_draw_is_bounded() {
        let mut capacity = Capacity::new("BioPharm".to_string(), 30, date(2025, 5, 1));
        assert_eq!(capacity.draw(20), 20);
        assert_eq!(capacity.excess_quantity, 10);
        assert_eq!(capacity.draw(25), 10);
        assert_eq!(capacity.excess_quantity, 0);
        assert!(capacity.is_exhausted());
    }

    #[test]
    fn test_eligibility_is_strict() {
        let capacity = Capacity::new("BioPharm".to_string(), 30, date(2025, 6, 1));
        assert!(capacity.is_eligible_for(date(2025, 6, 2)));
        assert!(!capacity.is_eligible_for(date(2025, 6, 1)));
        assert!(!capacity.is_eligible_for(date(2025, 5, 31)));
    }
}
