//! Core allocation matcher
//!
//! This module implements the deterministic deadline-priority matching
//! algorithm between outstanding demand and the supply pool.

use crate::result::{Assignment, Draw, MatchPlan, Residual};
use crate::types::{Capacity, Order, OrderStatus};
use chrono::NaiveDate;
use config::FulfillmentPolicy;
use tracing::debug;

/// Allocation matcher - pure and synchronous
///
/// CRITICAL PROPERTIES:
/// 1. Deterministic (same snapshot + date -> same plan, always)
/// 2. Pure function (no ledger access, no side effects)
/// 3. Priority-then-deadline demand ordering (strictly enforced)
/// 4. All-or-nothing commitment per order under the canonical policy
pub struct Matcher;

impl Matcher {
    /// Rank open demand for consumption: `Priority` orders first, then
    /// `Pending`, each group ascending by delivery deadline, ties broken by
    /// ascending order id. Non-open orders are dropped.
    pub fn rank_demand(orders: &[Order]) -> Vec<Order> {
        let mut demand: Vec<Order> = orders
            .iter()
            .filter(|o| o.status.is_open())
            .cloned()
            .collect();

        demand.sort_by(|a, b| {
            let group = |o: &Order| match o.status {
                OrderStatus::Priority => 0u8,
                _ => 1u8,
            };
            group(a)
                .cmp(&group(b))
                .then(a.delivery_deadline.cmp(&b.delivery_deadline))
                .then(a.id.cmp(&b.id))
        });

        demand
    }

    /// Compute an allocation plan over a ledger snapshot.
    ///
    /// The supply pool is shared state across the whole pass: doses drawn
    /// for one order are unavailable to every order ranked after it. Under
    /// `AllOrNothing`, an order whose eligible excess sum falls short of its
    /// remaining need is left untouched; under `Partial`, whatever eligible
    /// excess exists is consumed and the order stays open.
    pub fn plan(
        orders: &[Order],
        capacities: &[Capacity],
        as_of: NaiveDate,
        policy: FulfillmentPolicy,
    ) -> MatchPlan {
        let demand = Self::rank_demand(orders);
        let mut pool: Vec<Capacity> = capacities.to_vec();

        let mut assignments = Vec::new();
        let mut residuals = Vec::new();

        for order in &demand {
            let remaining = order.remaining();
            if remaining == 0 {
                continue;
            }

            // Eligibility: the batch must complete production strictly
            // before the order's promised delivery date. Ineligible batches
            // stay available for other orders.
            let mut eligible: Vec<usize> = pool
                .iter()
                .enumerate()
                .filter(|(_, c)| c.excess_quantity > 0 && c.is_eligible_for(order.delivery_deadline))
                .map(|(i, _)| i)
                .collect();

            // Consume the eligible batch completing latest first, reserving
            // batches with distant production deadlines for later orders.
            eligible.sort_by(|&a, &b| {
                pool[b]
                    .production_deadline
                    .cmp(&pool[a].production_deadline)
                    .then(pool[a].id.cmp(&pool[b].id))
            });

            let available: u32 = eligible.iter().map(|&i| pool[i].excess_quantity).sum();

            if available == 0
                || (policy == FulfillmentPolicy::AllOrNothing && available < remaining)
            {
                debug!(
                    order_id = %order.id,
                    remaining,
                    available,
                    "Order left untouched: insufficient eligible excess"
                );
                residuals.push(Residual {
                    order_id: order.id,
                    remaining,
                });
                continue;
            }

            let mut needed = remaining;
            let mut draws = Vec::new();
            for &i in &eligible {
                if needed == 0 {
                    break;
                }
                let drawn = pool[i].draw(needed);
                if drawn > 0 {
                    draws.push(Draw {
                        capacity_id: pool[i].id,
                        quantity: drawn,
                    });
                    needed -= drawn;
                }
            }

            let quantity_assigned = remaining - needed;
            let fully_covered = needed == 0;

            if !fully_covered {
                residuals.push(Residual {
                    order_id: order.id,
                    remaining: needed,
                });
            }

            assignments.push(Assignment {
                order_id: order.id,
                draws,
                quantity_assigned,
                fully_covered,
            });
        }

        // Final excess for every batch the plan drew from, in pool order.
        let touched: std::collections::HashSet<_> = assignments
            .iter()
            .flat_map(|a| a.draws.iter().map(|d| d.capacity_id))
            .collect();
        let capacity_excess: Vec<_> = pool
            .iter()
            .filter(|c| touched.contains(&c.id))
            .map(|c| (c.id, c.excess_quantity))
            .collect();

        let leftover_total: u32 = pool.iter().map(|c| c.excess_quantity).sum();

        MatchPlan {
            as_of,
            policy,
            assignments,
            residuals,
            capacity_excess,
            leftover_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(quantity: u32, deadline: NaiveDate, status: OrderStatus) -> Order {
        let mut o = Order::new("test-region".to_string(), quantity, deadline);
        o.status = status;
        o
    }

    fn capacity(excess: u32, deadline: NaiveDate) -> Capacity {
        Capacity::new("test-producer".to_string(), excess, deadline)
    }

    fn excess_of(plan: &MatchPlan, id: common::CapacityId) -> u32 {
        plan.capacity_excess
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, e)| *e)
            .expect("capacity not touched by plan")
    }

    #[test]
    fn test_priority_served_before_pending() {
        // Capacity 100 @ 2025-06-01; pending needs 60, priority needs 50.
        // Priority is matched first (excess -> 50), pending then falls short.
        let pool = vec![capacity(100, date(2025, 6, 1))];
        let orders = vec![
            order(60, date(2025, 6, 10), OrderStatus::Pending),
            order(50, date(2025, 6, 10), OrderStatus::Priority),
        ];
        let priority_id = orders[1].id;
        let pending_id = orders[0].id;

        let plan = Matcher::plan(&orders, &pool, date(2025, 5, 1), FulfillmentPolicy::AllOrNothing);

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].order_id, priority_id);
        assert!(plan.assignments[0].fully_covered);
        assert_eq!(excess_of(&plan, pool[0].id), 50);
        assert_eq!(plan.residuals.len(), 1);
        assert_eq!(plan.residuals[0].order_id, pending_id);
        assert_eq!(plan.residuals[0].remaining, 60);
        assert_eq!(plan.leftover_total, 50);
    }

    #[test]
    fn test_consumption_order_is_deadline_descending() {
        // Batches (30 @ 05-01) and (40 @ 05-20) for a need of 50 @ 06-01:
        // the later-completing batch is liquidated first.
        let pool = vec![
            capacity(30, date(2025, 5, 1)),
            capacity(40, date(2025, 5, 20)),
        ];
        let orders = vec![order(50, date(2025, 6, 1), OrderStatus::Pending)];

        let plan = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);

        assert_eq!(plan.assignments.len(), 1);
        let draws = &plan.assignments[0].draws;
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].capacity_id, pool[1].id);
        assert_eq!(draws[0].quantity, 40);
        assert_eq!(draws[1].capacity_id, pool[0].id);
        assert_eq!(draws[1].quantity, 10);
        assert_eq!(excess_of(&plan, pool[0].id), 20);
        assert_eq!(excess_of(&plan, pool[1].id), 0);
    }

    #[test]
    fn test_all_or_nothing_leaves_short_order_untouched() {
        let pool = vec![capacity(40, date(2025, 5, 1))];
        let orders = vec![order(50, date(2025, 6, 1), OrderStatus::Pending)];

        let plan = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);

        assert!(plan.assignments.is_empty());
        assert_eq!(plan.residuals.len(), 1);
        assert_eq!(plan.residuals[0].remaining, 50);
        // No excess was consumed for the short order.
        assert_eq!(plan.leftover_total, 40);
        assert!(plan.capacity_excess.is_empty());
    }

    #[test]
    fn test_eligibility_excludes_equal_and_later_deadlines() {
        // Production deadline must be strictly earlier than delivery.
        let pool = vec![
            capacity(100, date(2025, 6, 1)),
            capacity(100, date(2025, 6, 2)),
        ];
        let orders = vec![order(80, date(2025, 6, 1), OrderStatus::Pending)];

        let plan = Matcher::plan(&orders, &pool, date(2025, 5, 1), FulfillmentPolicy::AllOrNothing);

        assert!(plan.assignments.is_empty());
        assert_eq!(plan.residuals.len(), 1);
    }

    #[test]
    fn test_ineligible_batch_remains_visible_for_other_orders() {
        // The 06-05 batch is ineligible for the 06-01 order but serves the
        // 06-10 order.
        let pool = vec![capacity(100, date(2025, 6, 5))];
        let orders = vec![
            order(30, date(2025, 6, 1), OrderStatus::Pending),
            order(40, date(2025, 6, 10), OrderStatus::Pending),
        ];
        let late_id = orders[1].id;

        let plan = Matcher::plan(&orders, &pool, date(2025, 5, 1), FulfillmentPolicy::AllOrNothing);

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].order_id, late_id);
        assert_eq!(excess_of(&plan, pool[0].id), 60);
    }

    #[test]
    fn test_supply_is_shared_across_the_pass() {
        // Two orders, one batch: first in rank drains it, second falls short.
        let pool = vec![capacity(60, date(2025, 5, 1))];
        let orders = vec![
            order(50, date(2025, 6, 1), OrderStatus::Pending),
            order(50, date(2025, 6, 2), OrderStatus::Pending),
        ];
        let first_id = orders[0].id;

        let plan = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].order_id, first_id);
        assert_eq!(plan.residuals.len(), 1);
        assert_eq!(plan.leftover_total, 10);
    }

    #[test]
    fn test_rank_breaks_ties_by_id() {
        let mut a = order(10, date(2025, 6, 1), OrderStatus::Pending);
        let mut b = order(10, date(2025, 6, 1), OrderStatus::Pending);
        // Force a known id ordering.
        if b.id < a.id {
            std::mem::swap(&mut a, &mut b);
        }
        let ranked = Matcher::rank_demand(&[b.clone(), a.clone()]);
        assert_eq!(ranked[0].id, a.id);
        assert_eq!(ranked[1].id, b.id);
    }

    #[test]
    fn test_rank_drops_non_open_orders() {
        let mut fulfilled = order(10, date(2025, 6, 1), OrderStatus::Fulfilled);
        fulfilled.quantity_fulfilled = 10;
        let orders = vec![
            fulfilled,
            order(10, date(2025, 6, 1), OrderStatus::Expired),
            order(10, date(2025, 6, 1), OrderStatus::Cancelled),
            order(10, date(2025, 6, 1), OrderStatus::Pending),
        ];
        let ranked = Matcher::rank_demand(&orders);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].status, OrderStatus::Pending);
    }

    #[test]
    fn test_determinism() {
        let pool = vec![
            capacity(30, date(2025, 5, 1)),
            capacity(40, date(2025, 5, 20)),
            capacity(25, date(2025, 5, 10)),
        ];
        let orders = vec![
            order(50, date(2025, 6, 1), OrderStatus::Pending),
            order(20, date(2025, 6, 10), OrderStatus::Priority),
            order(35, date(2025, 5, 15), OrderStatus::Pending),
        ];

        let plan1 = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);
        let plan2 = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);

        assert_eq!(plan1.assignments, plan2.assignments);
        assert_eq!(plan1.residuals, plan2.residuals);
        assert_eq!(plan1.capacity_excess, plan2.capacity_excess);
        assert_eq!(plan1.leftover_total, plan2.leftover_total);
    }

    #[test]
    fn test_conservation() {
        // Excess drop across the pool equals the doses committed to
        // fully-covered orders.
        let pool = vec![
            capacity(80, date(2025, 5, 1)),
            capacity(45, date(2025, 5, 20)),
        ];
        let orders = vec![
            order(60, date(2025, 6, 1), OrderStatus::Pending),
            order(50, date(2025, 6, 2), OrderStatus::Priority),
            order(90, date(2025, 6, 3), OrderStatus::Pending),
        ];
        let before: u32 = pool.iter().map(|c| c.excess_quantity).sum();

        let plan = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);

        let fulfilled_need: u32 = orders
            .iter()
            .filter(|o| plan.fulfilled_order_ids().contains(&o.id))
            .map(|o| o.remaining())
            .sum();
        assert_eq!(before - plan.leftover_total, fulfilled_need);
        assert_eq!(plan.doses_allocated(), fulfilled_need);
    }

    #[test]
    fn test_partial_policy_consumes_available_excess() {
        let pool = vec![capacity(40, date(2025, 5, 1))];
        let orders = vec![order(50, date(2025, 6, 1), OrderStatus::Pending)];

        let plan = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::Partial);

        assert_eq!(plan.assignments.len(), 1);
        assert!(!plan.assignments[0].fully_covered);
        assert_eq!(plan.assignments[0].quantity_assigned, 40);
        assert_eq!(plan.residuals.len(), 1);
        assert_eq!(plan.residuals[0].remaining, 10);
        assert_eq!(plan.leftover_total, 0);
    }

    #[test]
    fn test_partial_policy_with_no_eligible_excess_is_residual() {
        let pool = vec![capacity(40, date(2025, 6, 1))];
        let orders = vec![order(50, date(2025, 6, 1), OrderStatus::Pending)];

        let plan = Matcher::plan(&orders, &pool, date(2025, 4, 1), FulfillmentPolicy::Partial);

        assert!(plan.assignments.is_empty());
        assert_eq!(plan.residuals.len(), 1);
        assert_eq!(plan.residuals[0].remaining, 50);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_plan() {
        let plan = Matcher::plan(&[], &[], date(2025, 4, 1), FulfillmentPolicy::AllOrNothing);
        assert!(!plan.has_assignments());
        assert!(plan.residuals.is_empty());
        assert_eq!(plan.leftover_total, 0);
    }
}
