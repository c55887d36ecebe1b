//! Result types for allocation passes

use chrono::NaiveDate;
use common::{CapacityId, OrderId};
use config::FulfillmentPolicy;
use serde::{Deserialize, Serialize};

/// A single draw of doses from one capacity for one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub capacity_id: CapacityId,
    pub quantity: u32,
}

/// Supply committed to one order by the matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Order receiving the doses
    pub order_id: OrderId,
    /// Draws in consumption order
    pub draws: Vec<Draw>,
    /// Total doses assigned across all draws
    pub quantity_assigned: u32,
    /// Whether the order's full remaining need was covered
    pub fully_covered: bool,
}

/// Demand the matcher could not (fully) cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residual {
    pub order_id: OrderId,
    /// Doses still needed after the pass
    pub remaining: u32,
}

/// Outcome of one matcher run over a ledger snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPlan {
    /// Date the pass ran against
    pub as_of: NaiveDate,
    /// Commitment policy the plan was computed under
    pub policy: FulfillmentPolicy,
    /// Orders with supply committed to them
    pub assignments: Vec<Assignment>,
    /// Unmatched (or partially matched) demand
    pub residuals: Vec<Residual>,
    /// Final excess for every capacity the plan touched
    pub capacity_excess: Vec<(CapacityId, u32)>,
    /// Total uncommitted excess remaining across the pool after the pass
    pub leftover_total: u32,
}

impl MatchPlan {
    /// An empty plan over a snapshot with nothing to do
    pub fn empty(as_of: NaiveDate, policy: FulfillmentPolicy, leftover_total: u32) -> Self {
        Self {
            as_of,
            policy,
            assignments: Vec::new(),
            residuals: Vec::new(),
            capacity_excess: Vec::new(),
            leftover_total,
        }
    }

    /// Check whether the plan commits any supply
    pub fn has_assignments(&self) -> bool {
        !self.assignments.is_empty()
    }

    /// Orders fully covered by this plan
    pub fn fulfilled_order_ids(&self) -> Vec<OrderId> {
        self.assignments
            .iter()
            .filter(|a| a.fully_covered)
            .map(|a| a.order_id)
            .collect()
    }

    /// Total doses committed across all assignments
    pub fn doses_allocated(&self) -> u32 {
        self.assignments.iter().map(|a| a.quantity_assigned).sum()
    }
}

/// Report returned by the allocation engine after committing a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    /// What triggered the pass
    pub trigger: PassTrigger,
    /// Date the pass ran against
    pub as_of: NaiveDate,
    /// Orders transitioned to fulfilled
    pub orders_fulfilled: Vec<OrderId>,
    /// Total doses committed in this pass
    pub doses_allocated: u32,
    /// Uncommitted excess remaining after the pass
    pub leftover_total: u32,
}

/// External triggers that start an allocation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassTrigger {
    /// A new supply batch was registered
    CapacityRegistered,
    /// An explicit budget-capped fulfillment request
    FulfillmentRequest,
}

impl std::fmt::Display for PassTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassTrigger::CapacityRegistered => write!(f, "capacity_registered"),
            PassTrigger::FulfillmentRequest => write!(f, "fulfillment_request"),
        }
    }
}
