//! Allocation engine - orchestrates passes against the ledgers
//!
//! One engine instance owns mutation access to both ledgers. Every
//! allocation pass and every expiry sweep runs through the command gate, so
//! no two passes can interleave their snapshot/commit windows.

use crate::error::{AllocationError, AllocationResult};
use crate::event::{AllocationEvent, LogListener, PassListener};
use crate::ledger::traits::{CapacityLedger, OrderLedger};
use crate::matcher::Matcher;
use crate::metrics::EngineMetrics;
use crate::result::{MatchPlan, PassReport, PassTrigger};
use crate::types::{Capacity, Order, OrderStatus};
use chrono::{NaiveDate, Utc};
use common::OrderId;
use config::FulfillmentPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const OPEN_STATUSES: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Priority];

/// Allocation engine - matches outstanding demand against the supply pool
pub struct AllocationEngine {
    orders: Arc<dyn OrderLedger>,
    capacities: Arc<dyn CapacityLedger>,
    policy: FulfillmentPolicy,
    listener: Arc<dyn PassListener>,
    metrics: Arc<EngineMetrics>,
    /// Command gate: at most one pass or sweep mutates the ledgers at a time
    commands: Mutex<()>,
}

impl AllocationEngine {
    /// Create a new engine over the given ledgers
    pub fn new(
        orders: Arc<dyn OrderLedger>,
        capacities: Arc<dyn CapacityLedger>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            orders,
            capacities,
            policy,
            listener: Arc::new(LogListener),
            metrics: Arc::new(EngineMetrics::new()),
            commands: Mutex::new(()),
        }
    }

    /// Attach a downstream pass listener
    pub fn with_listener(mut self, listener: Arc<dyn PassListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Engine metrics handle
    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    // ------------------------------------------------------------------
    // Order operations
    // ------------------------------------------------------------------

    /// Create a new pending order
    pub async fn create_order(
        &self,
        region: &str,
        quantity_requested: u32,
        delivery_deadline: NaiveDate,
    ) -> AllocationResult<Order> {
        if region.trim().is_empty() {
            return Err(AllocationError::InvalidInput(
                "region cannot be empty".to_string(),
            ));
        }
        if quantity_requested == 0 {
            return Err(AllocationError::InvalidInput(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let order = self
            .orders
            .create(region, quantity_requested, delivery_deadline)
            .await?;
        info!(
            order_id = %order.id,
            region = %order.region,
            quantity = order.quantity_requested,
            deadline = %order.delivery_deadline,
            "Order created"
        );
        Ok(order)
    }

    /// Get an order by id
    pub async fn get_order(&self, id: OrderId) -> AllocationResult<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or(AllocationError::OrderNotFound(id))
    }

    /// List orders in any of the given statuses
    pub async fn list_orders(&self, statuses: &[OrderStatus]) -> AllocationResult<Vec<Order>> {
        self.orders.list_by_status(statuses).await
    }

    /// List orders for a region
    pub async fn list_orders_by_region(&self, region: &str) -> AllocationResult<Vec<Order>> {
        self.orders.list_by_region(region).await
    }

    /// List every registered supply batch
    pub async fn list_capacities(&self) -> AllocationResult<Vec<Capacity>> {
        self.capacities.list_all().await
    }

    /// Promote an expired order back into the queue ahead of pending demand
    pub async fn promote_to_priority(&self, id: OrderId) -> AllocationResult<Order> {
        let order = self.get_order(id).await?;
        if order.status != OrderStatus::Expired {
            return Err(AllocationError::InvalidStateTransition {
                from: order.status.to_string(),
                to: OrderStatus::Priority.to_string(),
            });
        }

        self.orders.update_status(id, OrderStatus::Priority).await?;
        info!(order_id = %id, "Order promoted to priority");
        self.get_order(id).await
    }

    /// Cancel an order. Cancelling an already-cancelled order is a no-op;
    /// fulfilled orders cannot be cancelled.
    pub async fn cancel_order(&self, id: OrderId) -> AllocationResult<Order> {
        let order = self.get_order(id).await?;
        if order.status == OrderStatus::Cancelled {
            return Ok(order);
        }
        if !order.can_cancel() {
            return Err(AllocationError::InvalidStateTransition {
                from: order.status.to_string(),
                to: OrderStatus::Cancelled.to_string(),
            });
        }

        self.orders.update_status(id, OrderStatus::Cancelled).await?;
        info!(order_id = %id, "Order cancelled");
        self.get_order(id).await
    }

    // ------------------------------------------------------------------
    // Allocation passes
    // ------------------------------------------------------------------

    /// Register a new supply batch and run a full allocation pass
    pub async fn register_capacity(
        &self,
        producer_name: &str,
        quantity_produced: u32,
        production_deadline: NaiveDate,
    ) -> AllocationResult<Capacity> {
        self.register_capacity_at(
            producer_name,
            quantity_produced,
            production_deadline,
            Utc::now().date_naive(),
        )
        .await
    }

    /// Register a new supply batch, running the pass against an explicit date
    pub async fn register_capacity_at(
        &self,
        producer_name: &str,
        quantity_produced: u32,
        production_deadline: NaiveDate,
        as_of: NaiveDate,
    ) -> AllocationResult<Capacity> {
        if producer_name.trim().is_empty() {
            return Err(AllocationError::InvalidInput(
                "producer name cannot be empty".to_string(),
            ));
        }
        if quantity_produced == 0 {
            return Err(AllocationError::InvalidInput(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let capacity = self
            .capacities
            .create(producer_name, quantity_produced, production_deadline)
            .await?;
        info!(
            capacity_id = %capacity.id,
            producer = %capacity.producer_name,
            quantity = capacity.quantity_produced,
            deadline = %capacity.production_deadline,
            "Capacity registered"
        );

        let _guard = self.commands.lock().await;
        self.run_pass_locked(PassTrigger::CapacityRegistered, as_of)
            .await?;
        Ok(capacity)
    }

    /// Run a full allocation pass over current ledger state
    pub async fn run_allocation_pass(&self, trigger: PassTrigger) -> AllocationResult<PassReport> {
        self.run_allocation_pass_at(trigger, Utc::now().date_naive())
            .await
    }

    /// Run a full allocation pass against an explicit date
    pub async fn run_allocation_pass_at(
        &self,
        trigger: PassTrigger,
        as_of: NaiveDate,
    ) -> AllocationResult<PassReport> {
        let _guard = self.commands.lock().await;
        self.run_pass_locked(trigger, as_of).await
    }

    /// Fulfill open orders from an externally supplied budget of doses.
    /// Returns the doses left over after the pass.
    pub async fn request_fulfillment(&self, budget: u32) -> AllocationResult<u32> {
        self.request_fulfillment_at(budget, Utc::now().date_naive())
            .await
    }

    /// Budget-capped fulfillment against an explicit date
    pub async fn request_fulfillment_at(
        &self,
        budget: u32,
        as_of: NaiveDate,
    ) -> AllocationResult<u32> {
        if budget == 0 {
            return Err(AllocationError::InvalidInput(
                "budget must be greater than 0".to_string(),
            ));
        }

        let _guard = self.commands.lock().await;
        let started = Instant::now();

        let open = self.orders.list_by_status(&OPEN_STATUSES).await?;
        // The budget behaves like a single batch of supply on hand: it is
        // never persisted and whatever is not drawn is handed back.
        let synthetic = Capacity::synthetic(budget, as_of);
        let plan = Matcher::plan(&open, std::slice::from_ref(&synthetic), as_of, self.policy);

        let snapshot: HashMap<OrderId, Order> = open.iter().map(|o| (o.id, o.clone())).collect();
        let fulfilled = self.commit_plan(&plan, &snapshot, false).await?;
        let leftover = plan.leftover_total;

        self.metrics.record_pass(
            fulfilled.len() as u64,
            plan.doses_allocated() as u64,
            started.elapsed(),
        );
        self.refresh_open_gauge().await;

        info!(
            budget,
            leftover,
            orders_fulfilled = fulfilled.len(),
            "Fulfillment request completed"
        );
        self.notify(AllocationEvent::PassCompleted {
            trigger: PassTrigger::FulfillmentRequest,
            orders_fulfilled: fulfilled,
            doses_allocated: plan.doses_allocated(),
            leftover_total: leftover,
        })
        .await;

        Ok(leftover)
    }

    #[instrument(skip(self))]
    async fn run_pass_locked(
        &self,
        trigger: PassTrigger,
        as_of: NaiveDate,
    ) -> AllocationResult<PassReport> {
        let started = Instant::now();

        let open = self.orders.list_by_status(&OPEN_STATUSES).await?;
        let pool = self.capacities.list_all().await?;
        debug!(
            open_orders = open.len(),
            capacities = pool.len(),
            %trigger,
            "Starting allocation pass"
        );

        let plan = Matcher::plan(&open, &pool, as_of, self.policy);
        let snapshot: HashMap<OrderId, Order> = open.iter().map(|o| (o.id, o.clone())).collect();
        let fulfilled = self.commit_plan(&plan, &snapshot, true).await?;

        let report = PassReport {
            trigger,
            as_of,
            orders_fulfilled: fulfilled,
            doses_allocated: plan.doses_allocated(),
            leftover_total: plan.leftover_total,
        };

        self.metrics.record_pass(
            report.orders_fulfilled.len() as u64,
            report.doses_allocated as u64,
            started.elapsed(),
        );
        self.refresh_open_gauge().await;

        info!(
            %trigger,
            orders_fulfilled = report.orders_fulfilled.len(),
            doses_allocated = report.doses_allocated,
            leftover_total = report.leftover_total,
            "Allocation pass committed"
        );
        self.notify(AllocationEvent::PassCompleted {
            trigger,
            orders_fulfilled: report.orders_fulfilled.clone(),
            doses_allocated: report.doses_allocated,
            leftover_total: report.leftover_total,
        })
        .await;

        Ok(report)
    }

    /// Commit a plan to the ledgers as one logical transaction.
    ///
    /// Every write is attempted even after a failure; if any write fails the
    /// whole commit reports which record ids landed and which did not.
    /// Applied writes are not rolled back - each one is individually
    /// consistent (excess only decreases by doses actually drawn).
    async fn commit_plan(
        &self,
        plan: &MatchPlan,
        snapshot: &HashMap<OrderId, Order>,
        persist_capacity_writes: bool,
    ) -> AllocationResult<Vec<OrderId>> {
        let mut committed: Vec<String> = Vec::new();
        let mut failed: Vec<String> = Vec::new();
        let mut fulfilled: Vec<OrderId> = Vec::new();

        if persist_capacity_writes {
            for (capacity_id, excess) in &plan.capacity_excess {
                match self.capacities.update_excess(*capacity_id, *excess).await {
                    Ok(()) => committed.push(capacity_id.to_string()),
                    Err(e) => {
                        warn!(capacity_id = %capacity_id, error = %e, "Capacity write failed");
                        failed.push(capacity_id.to_string());
                    }
                }
            }
        }

        for assignment in &plan.assignments {
            let Some(order) = snapshot.get(&assignment.order_id) else {
                warn!(order_id = %assignment.order_id, "Assigned order missing from snapshot");
                failed.push(assignment.order_id.to_string());
                continue;
            };

            let quantity_fulfilled = order.quantity_fulfilled + assignment.quantity_assigned;
            let status = if quantity_fulfilled >= order.quantity_requested {
                OrderStatus::Fulfilled
            } else {
                order.status
            };

            match self
                .orders
                .update_fulfillment(assignment.order_id, quantity_fulfilled, status)
                .await
            {
                Ok(()) => {
                    committed.push(assignment.order_id.to_string());
                    if status == OrderStatus::Fulfilled {
                        fulfilled.push(assignment.order_id);
                    }
                }
                Err(e) => {
                    warn!(order_id = %assignment.order_id, error = %e, "Order write failed");
                    failed.push(assignment.order_id.to_string());
                }
            }
        }

        if !failed.is_empty() {
            return Err(AllocationError::PartialCommitFailure { committed, failed });
        }
        Ok(fulfilled)
    }

    // ------------------------------------------------------------------
    // Expiry sweep
    // ------------------------------------------------------------------

    /// Transition overdue pending orders to expired. Idempotent: sweeping
    /// again with the same date changes nothing further.
    pub async fn sweep_expirations(&self, now: NaiveDate) -> AllocationResult<usize> {
        let _guard = self.commands.lock().await;

        let pending = self.orders.list_by_status(&[OrderStatus::Pending]).await?;
        let mut expired: Vec<OrderId> = Vec::new();

        for order in pending.iter().filter(|o| o.is_overdue(now)) {
            self.orders
                .update_status(order.id, OrderStatus::Expired)
                .await?;
            debug!(order_id = %order.id, deadline = %order.delivery_deadline, "Order expired");
            expired.push(order.id);
        }

        self.metrics.record_sweep(expired.len() as u64);
        self.refresh_open_gauge().await;

        if !expired.is_empty() {
            info!(orders_expired = expired.len(), %now, "Expiry sweep transitioned orders");
            self.notify(AllocationEvent::OrdersExpired {
                order_ids: expired.clone(),
            })
            .await;
        }

        Ok(expired.len())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn refresh_open_gauge(&self) {
        if let Ok(open) = self.orders.list_by_status(&OPEN_STATUSES).await {
            self.metrics.set_open_orders(open.len() as u64);
        }
    }

    async fn notify(&self, event: AllocationEvent) {
        if let Err(e) = self.listener.on_event(&event).await {
            warn!(error = %e, "Pass listener failed; ledger state is unaffected");
        }
    }
}
