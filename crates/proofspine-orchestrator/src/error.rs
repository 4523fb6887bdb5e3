use proofspine_ledger::LedgerError;
use proofspine_swarm::SwarmError;
use proofspine_types::{BatchId, WorkerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("unknown batch {batch_id}")]
    UnknownBatch { batch_id: BatchId },

    #[error("batch {batch_id} is already open")]
    BatchAlreadyOpen { batch_id: BatchId },

    #[error("worker {worker_id} already reported for batch {batch_id}")]
    DuplicateWorkerReport {
        batch_id: BatchId,
        worker_id: WorkerId,
    },

    #[error("worker {worker_id} is not expected in batch {batch_id}")]
    UnexpectedWorker {
        batch_id: BatchId,
        worker_id: WorkerId,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Swarm(#[from] SwarmError),
}
