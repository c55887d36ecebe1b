//! Allocation & Expiry Engine for VaxDist
//!
//! This crate implements the core allocation logic of the distribution
//! system: matching regional demand orders against producer supply batches
//! under deadline eligibility and an all-or-nothing commitment policy, plus
//! the periodic sweep that ages out unmet demand.
//!
//! The surrounding service layer owns transport and durable storage; it
//! plugs in through the [`ledger`] traits and the [`event::PassListener`]
//! notification seam.

pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod matcher;
pub mod metrics;
pub mod result;
pub mod sweeper;
pub mod types;

pub use engine::AllocationEngine;
pub use error::{AllocationError, AllocationResult};
pub use event::{AllocationEvent, LogListener, PassListener};
pub use ledger::{CapacityLedger, InMemoryCapacityLedger, InMemoryOrderLedger, OrderLedger};
pub use matcher::Matcher;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use result::{Assignment, Draw, MatchPlan, PassReport, PassTrigger, Residual};
pub use sweeper::ExpirySweeper;
pub use types::{Capacity, Order, OrderStatus};
