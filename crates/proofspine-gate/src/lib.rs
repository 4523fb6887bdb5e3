//! Proofspine enforcement gate.
//!
//! The gate is the single choke point for protected operations: a
//! request must carry a well-formed, never-before-seen proof envelope
//! or it is blocked. Every verdict, allow or deny, lands on the proof
//! ledger before the caller hears about it. There is no bypass and no
//! advisory mode.

#![deny(unsafe_code)]

pub mod error;
pub mod gate;

pub use error::{DenialReason, GateError};
pub use gate::{
    AllowToken, Denial, EnforcementGate, GateDecision, ProtectedRequest, SubmittedProof,
};
