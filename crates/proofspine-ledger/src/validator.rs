use proofspine_types::{content_hash, link_hash, Digest, ProofRecord, GENESIS_CHAIN_HASH};
use tracing::info;

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// Result of a successful full-chain verification.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    pub records: u64,
    pub last_chain_hash: Digest,
}

/// Startup integrity validator.
///
/// Recomputes every content hash and chain link from genesis forward
/// and checks the sequence for gaps. Any mismatch is fatal: the caller
/// must refuse to serve, and nothing here attempts repair.
pub struct IntegrityValidator;

impl IntegrityValidator {
    /// Verify the full chain held by `reader`.
    pub fn validate(reader: &dyn LedgerReader) -> Result<ValidationReport, LedgerError> {
        let records = reader.read_all()?;
        let report = Self::validate_records(&records)?;
        info!(records = report.records, "ledger integrity verified");
        Ok(report)
    }

    /// Verify an already-materialized record slice. Records must be in
    /// sequence order. Fails at the first violated record.
    pub fn validate_records(records: &[ProofRecord]) -> Result<ValidationReport, LedgerError> {
        let mut prev_chain = GENESIS_CHAIN_HASH;

        for (index, record) in records.iter().enumerate() {
            let expected_seq = index as u64 + 1;
            if record.sequence_number != expected_seq {
                return Err(LedgerError::IntegrityViolation {
                    seq: expected_seq,
                    reason: format!(
                        "sequence gap: expected {expected_seq}, found {}",
                        record.sequence_number
                    ),
                });
            }

            let computed_content = content_hash(&record.payload);
            if computed_content != record.content_hash {
                return Err(LedgerError::IntegrityViolation {
                    seq: record.sequence_number,
                    reason: "content hash does not match payload".into(),
                });
            }

            let computed_chain = link_hash(&prev_chain, &record.content_hash);
            if computed_chain != record.chain_hash {
                return Err(LedgerError::IntegrityViolation {
                    seq: record.sequence_number,
                    reason: "chain hash does not link to predecessor".into(),
                });
            }

            prev_chain = record.chain_hash;
        }

        Ok(ValidationReport {
            records: records.len() as u64,
            last_chain_hash: prev_chain,
        })
    }
}
