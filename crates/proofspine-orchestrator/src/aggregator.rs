use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use proofspine_ledger::{LedgerError, ProofLedger};
use proofspine_types::{
    combined_digest, BatchId, ChildProof, OrchestrationRecord, OrchestrationStatus, ProofType,
    WorkerId,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::OrchestrationError;

struct BatchEntry {
    record: OrchestrationRecord,
    progress: watch::Sender<usize>,
}

/// All-or-nothing batch aggregator.
///
/// A batch settles only when every expected worker has delivered its
/// outcome proof; the combined digest and the aggregate ledger record
/// come into existence together, exactly once, at that moment. A batch
/// that times out or is cancelled still ends with a terminal ledger
/// record, just never with a digest. No partial aggregate is ever
/// observable.
///
/// Tracking state is transient: once a batch's terminal record is on
/// the ledger the aggregator forgets it, so a closed batch id reads as
/// unknown (and may be reused). One `await_completion` call settles a
/// given batch.
pub struct OrchestrationAggregator {
    ledger: Arc<dyn ProofLedger>,
    batches: Mutex<HashMap<BatchId, BatchEntry>>,
}

impl OrchestrationAggregator {
    pub fn new(ledger: Arc<dyn ProofLedger>) -> Self {
        Self {
            ledger,
            batches: Mutex::new(HashMap::new()),
        }
    }

    /// Register a batch and the exact worker set it is waiting on.
    pub fn open_batch(
        &self,
        batch_id: BatchId,
        expected_workers: BTreeSet<WorkerId>,
    ) -> Result<(), OrchestrationError> {
        let mut batches = self.lock_batches()?;
        if batches.contains_key(&batch_id) {
            return Err(OrchestrationError::BatchAlreadyOpen { batch_id });
        }

        info!(batch = %batch_id, workers = expected_workers.len(), "batch opened");
        let record = OrchestrationRecord::open(batch_id.clone(), expected_workers);
        let (progress, _) = watch::channel(0);
        batches.insert(batch_id, BatchEntry { record, progress });
        Ok(())
    }

    /// Record one worker's outcome proof. Each expected worker reports
    /// at most once; a report to a batch that already closed reads as
    /// unknown, since closed batches are forgotten.
    pub fn worker_completed(
        &self,
        batch_id: &BatchId,
        worker_id: WorkerId,
        child: ChildProof,
    ) -> Result<(), OrchestrationError> {
        let mut batches = self.lock_batches()?;
        let entry = batches
            .get_mut(batch_id)
            .ok_or_else(|| OrchestrationError::UnknownBatch {
                batch_id: batch_id.clone(),
            })?;

        if !entry.record.expected_workers.contains(&worker_id) {
            return Err(OrchestrationError::UnexpectedWorker {
                batch_id: batch_id.clone(),
                worker_id,
            });
        }
        if entry.record.child_proofs.contains_key(&worker_id) {
            return Err(OrchestrationError::DuplicateWorkerReport {
                batch_id: batch_id.clone(),
                worker_id,
            });
        }

        entry.record.child_proofs.insert(worker_id, child);
        entry.progress.send_replace(entry.record.child_proofs.len());
        Ok(())
    }

    /// Wait until the batch settles or `timeout` elapses.
    ///
    /// On completion the aggregate proof is appended and the batch is
    /// `Settled`; on timeout it is closed `Incomplete` with a terminal
    /// record and no digest. Either way the returned record is final.
    pub async fn await_completion(
        &self,
        batch_id: &BatchId,
        timeout: Duration,
    ) -> Result<OrchestrationRecord, OrchestrationError> {
        let mut progress = {
            let batches = self.lock_batches()?;
            let entry = batches
                .get(batch_id)
                .ok_or_else(|| OrchestrationError::UnknownBatch {
                    batch_id: batch_id.clone(),
                })?;
            entry.progress.subscribe()
        };

        let wait = tokio::time::timeout(timeout, async {
            loop {
                if let Some(done) = self.poll_finished(batch_id) {
                    return done;
                }
                if progress.changed().await.is_err() {
                    return true;
                }
            }
        })
        .await;

        match wait {
            Ok(_) => self.settle(batch_id),
            Err(_) => self.close_incomplete(batch_id),
        }
    }

    /// Cancel an open batch, leaving an `Aborted` terminal record.
    pub fn cancel_batch(&self, batch_id: &BatchId) -> Result<OrchestrationRecord, OrchestrationError> {
        self.finalize(batch_id, OrchestrationStatus::Aborted)
    }

    /// Snapshot of a batch's current record.
    pub fn batch(&self, batch_id: &BatchId) -> Result<OrchestrationRecord, OrchestrationError> {
        let batches = self.lock_batches()?;
        batches
            .get(batch_id)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| OrchestrationError::UnknownBatch {
                batch_id: batch_id.clone(),
            })
    }

    fn lock_batches(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<BatchId, BatchEntry>>, OrchestrationError> {
        self.batches
            .lock()
            .map_err(|_| OrchestrationError::Ledger(LedgerError::LockPoisoned))
    }

    fn poll_finished(&self, batch_id: &BatchId) -> Option<bool> {
        let batches = self.batches.lock().ok()?;
        match batches.get(batch_id) {
            // Entry gone means the batch was closed elsewhere.
            None => Some(true),
            Some(entry) if entry.record.is_complete() => Some(true),
            Some(_) => None,
        }
    }

    /// Settle a complete batch: emit the aggregate proof, then drop
    /// the tracking entry. The entry is removed only after the record
    /// is durably appended.
    fn settle(&self, batch_id: &BatchId) -> Result<OrchestrationRecord, OrchestrationError> {
        let mut batches = self.lock_batches()?;
        let entry = batches
            .get(batch_id)
            .ok_or_else(|| OrchestrationError::UnknownBatch {
                batch_id: batch_id.clone(),
            })?;

        let mut record = entry.record.clone();
        record.combined_digest = Some(combined_digest(&record.child_proofs));
        record.status = OrchestrationStatus::Settled;
        record.settled_at = Some(Utc::now());

        let payload = serde_json::to_value(&record)
            .map_err(|error| LedgerError::Serialization(error.to_string()))?;
        self.ledger.append(payload, ProofType::Orchestration)?;
        batches.remove(batch_id);

        info!(
            batch = %batch_id,
            children = record.child_proofs.len(),
            "batch settled"
        );
        Ok(record)
    }

    fn close_incomplete(&self, batch_id: &BatchId) -> Result<OrchestrationRecord, OrchestrationError> {
        self.finalize(batch_id, OrchestrationStatus::Incomplete)
    }

    fn finalize(
        &self,
        batch_id: &BatchId,
        status: OrchestrationStatus,
    ) -> Result<OrchestrationRecord, OrchestrationError> {
        let mut batches = self.lock_batches()?;
        let entry = batches
            .get(batch_id)
            .ok_or_else(|| OrchestrationError::UnknownBatch {
                batch_id: batch_id.clone(),
            })?;

        let mut record = entry.record.clone();
        record.status = status;
        record.settled_at = Some(Utc::now());
        // Deliberately no combined digest for an unfinished batch.

        let payload = serde_json::to_value(&record)
            .map_err(|error| LedgerError::Serialization(error.to_string()))?;
        self.ledger.append(payload, ProofType::Orchestration)?;
        if let Some(entry) = batches.remove(batch_id) {
            entry.progress.send_replace(record.child_proofs.len());
        }

        warn!(
            batch = %batch_id,
            status = ?status,
            missing = record.missing_workers().len(),
            "batch closed without settlement"
        );
        Ok(record)
    }
}
