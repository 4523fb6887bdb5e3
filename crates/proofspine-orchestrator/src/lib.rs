//! Proofspine batch orchestration.
//!
//! The aggregator enforces all-or-nothing settlement: a batch's
//! combined digest and its aggregate ledger proof exist only once every
//! expected worker has delivered an outcome proof. Batches that time
//! out or are cancelled still end in a recorded terminal state. The
//! runtime wires the deterministic dispatcher and the worker executors
//! into that lifecycle.

#![deny(unsafe_code)]

pub mod aggregator;
pub mod error;
pub mod runtime;

pub use aggregator::OrchestrationAggregator;
pub use error::OrchestrationError;
pub use runtime::{BatchOutcome, SwarmRuntime};
