use proofspine_types::ProofId;
use thiserror::Error;

/// Errors returned by ledger interfaces.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    #[error("ledger integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("duplicate proof {proof_id} already accepted")]
    DuplicateProof { proof_id: ProofId },

    #[error("proof id {proof_id} resubmitted with different content")]
    ProofCollision { proof_id: ProofId },
}

impl LedgerError {
    /// Integrity failures are fatal at startup and never auto-repaired.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, LedgerError::IntegrityViolation { .. })
    }
}
