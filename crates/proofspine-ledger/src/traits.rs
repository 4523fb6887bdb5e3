use proofspine_types::{ProofRecord, ProofType};
use serde_json::Value;

use crate::error::LedgerError;

/// Write boundary for the proof ledger.
///
/// Append is the only mutation the ledger exposes. The implementation
/// must serialize read-latest -> append -> flush under one lock, and
/// the record must be durable on stable storage before `append`
/// returns.
pub trait LedgerWriter: Send + Sync {
    fn append(&self, payload: Value, proof_type: ProofType) -> Result<ProofRecord, LedgerError>;
}

/// Read boundary for the proof ledger. Readers may run concurrently
/// with each other but never observe a partially appended record.
pub trait LedgerReader: Send + Sync {
    /// All records in sequence order.
    fn read_all(&self) -> Result<Vec<ProofRecord>, LedgerError>;

    /// The most recently appended record, if any.
    fn head(&self) -> Result<Option<ProofRecord>, LedgerError>;

    /// Number of committed records.
    fn len(&self) -> Result<u64, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

/// Full ledger boundary handed to components that both audit and read.
pub trait ProofLedger: LedgerReader + LedgerWriter {}

impl<T: LedgerReader + LedgerWriter> ProofLedger for T {}
