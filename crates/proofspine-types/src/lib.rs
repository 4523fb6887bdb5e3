//! Proofspine core data model.
//!
//! This crate defines the immutable units the rest of the system moves
//! around:
//! - hash-chained [`ProofRecord`]s and the canonical hashing rules they
//!   depend on
//! - the [`ProofDecisionOutcome`] envelope binding a decision to its
//!   inputs, policy, action, and observed outcome
//! - tasks, worker templates, and deterministic worker clones
//! - batch orchestration records and their combined digest

#![deny(unsafe_code)]

pub mod orchestration;
pub mod pdo;
pub mod record;
pub mod task;

pub use orchestration::{
    BatchId, ChildProof, OrchestrationRecord, OrchestrationStatus, combined_digest,
};
pub use pdo::{InputRef, PdoState, PdoTransitionError, ProofDecisionOutcome};
pub use record::{
    content_hash, link_hash, AcceptedProof, Digest, ProofId, ProofRecord, ProofType,
    ACCEPTED_PROOF_KEY, GENESIS_CHAIN_HASH,
};
pub use task::{Allocation, Task, TaskStatus, Worker, WorkerCapability, WorkerId, WorkerTemplate};
