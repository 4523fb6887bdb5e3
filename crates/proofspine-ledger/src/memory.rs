use std::sync::RwLock;

use chrono::Utc;
use proofspine_types::{
    content_hash, link_hash, ProofId, ProofRecord, ProofType, GENESIS_CHAIN_HASH,
};
use serde_json::Value;

use crate::error::LedgerError;
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory proof ledger with the same append semantics as the
/// file-backed one. Used by tests and by embedders that bring their
/// own persistence.
#[derive(Default)]
pub struct InMemoryLedger {
    records: RwLock<Vec<ProofRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger from previously persisted records. The records
    /// are taken as-is; run the integrity validator before trusting
    /// them.
    pub fn from_records(records: Vec<ProofRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Test hook: overwrite the payload of the record at `seq` without
    /// touching its hashes, simulating post-write tampering.
    #[cfg(test)]
    pub(crate) fn tamper_payload(&self, seq: u64, payload: Value) {
        let mut records = self.records.write().unwrap();
        let record = records
            .iter_mut()
            .find(|record| record.sequence_number == seq)
            .expect("no record at seq");
        record.payload = payload;
    }

    /// Test hook: rewrite a stored chain hash in place.
    #[cfg(test)]
    pub(crate) fn tamper_chain_hash(&self, seq: u64, chain_hash: proofspine_types::Digest) {
        let mut records = self.records.write().unwrap();
        let record = records
            .iter_mut()
            .find(|record| record.sequence_number == seq)
            .expect("no record at seq");
        record.chain_hash = chain_hash;
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append(&self, payload: Value, proof_type: ProofType) -> Result<ProofRecord, LedgerError> {
        let mut records = self.records.write().map_err(|_| LedgerError::LockPoisoned)?;

        let prev_chain = records
            .last()
            .map(|record| record.chain_hash)
            .unwrap_or(GENESIS_CHAIN_HASH);
        let content = content_hash(&payload);
        let record = ProofRecord {
            proof_id: ProofId::generate(),
            content_hash: content,
            chain_hash: link_hash(&prev_chain, &content),
            sequence_number: records.len() as u64 + 1,
            timestamp: Utc::now(),
            proof_type,
            payload,
        };
        records.push(record.clone());
        Ok(record)
    }
}

impl LedgerReader for InMemoryLedger {
    fn read_all(&self) -> Result<Vec<ProofRecord>, LedgerError> {
        let records = self.records.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(records.clone())
    }

    fn head(&self) -> Result<Option<ProofRecord>, LedgerError> {
        let records = self.records.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(records.last().cloned())
    }

    fn len(&self) -> Result<u64, LedgerError> {
        let records = self.records.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(records.len() as u64)
    }
}
