//! Proofspine proof ledger.
//!
//! This crate provides:
//! - append-only reader/writer trait boundaries for proof records
//! - a durable file-backed ledger (newline-delimited JSON, one record
//!   per line, flushed to stable storage before the write lock is
//!   released)
//! - an in-memory ledger for tests and embedding
//! - the startup integrity validator that recomputes the full hash
//!   chain and refuses to let the process serve with an unverifiable
//!   ledger
//! - the replay guard rejecting duplicate and colliding proof ids
//!
//! There is deliberately no update or delete operation anywhere in the
//! public contract.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod replay;
pub mod traits;
pub mod validator;

pub use config::{LedgerConfig, CACHE_MANIFEST_ENV, LEDGER_PATH_ENV};
pub use error::LedgerError;
pub use file::{CacheManifest, FileProofLedger};
pub use memory::InMemoryLedger;
pub use replay::{ReplayCheck, ReplayGuard};
pub use traits::{LedgerReader, LedgerWriter, ProofLedger};
pub use validator::{IntegrityValidator, ValidationReport};
