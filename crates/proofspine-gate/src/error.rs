use proofspine_ledger::LedgerError;
use proofspine_types::ProofId;
use thiserror::Error;

/// Why the gate blocked an operation.
///
/// Every variant has a stable machine-readable code so callers and
/// audit tooling can classify denials without parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DenialReason {
    #[error("no proof accompanied the request")]
    MissingProof,

    #[error("proof is malformed: required field `{field}` is missing or empty")]
    MalformedProof { field: &'static str },

    #[error("proof {proof_id} was already accepted")]
    ReplayDetected { proof_id: ProofId },

    #[error("proof {proof_id} resubmitted with different content")]
    CollisionDetected { proof_id: ProofId },
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::MissingProof => "missing-proof",
            DenialReason::MalformedProof { .. } => "malformed-proof",
            DenialReason::ReplayDetected { .. } => "replay-detected",
            DenialReason::CollisionDetected { .. } => "collision-detected",
        }
    }
}

/// Infrastructure failures inside the gate. Distinct from a denial:
/// a denial is the gate working as intended, a `GateError` means the
/// gate could not reach a trustworthy verdict. Both block the
/// operation.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
