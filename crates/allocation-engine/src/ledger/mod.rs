//! Ledger abstractions for orders and capacities
//!
//! The engine consumes the two ledgers through traits so durable storage
//! implementations can be swapped in by the surrounding service layer
//! without touching the allocation logic.

pub mod memory;
pub mod traits;

pub use memory::{InMemoryCapacityLedger, InMemoryOrderLedger};
pub use traits::{CapacityLedger, OrderLedger};
