use proofspine_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("cannot dispatch to an empty worker roster")]
    EmptyRoster,

    #[error("unknown worker template `{id}`")]
    UnknownTemplate { id: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
