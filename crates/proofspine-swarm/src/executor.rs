use std::sync::Arc;

use async_trait::async_trait;
use proofspine_ledger::ProofLedger;
use proofspine_types::{ChildProof, ProofType, Task, TaskStatus, Worker, WorkerId};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::SwarmError;

/// A task that could not be executed. The failure is recorded on the
/// ledger and in the worker report; it does not abort the queue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TaskFailure(pub String);

/// Pluggable task execution logic.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn execute(&self, worker: &Worker, task: &Task) -> Result<Value, TaskFailure>;
}

/// What one worker produced for its queue: per-task tallies plus the
/// outcome proof the orchestrator aggregates.
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub outcome: ChildProof,
}

/// Executes one worker's task queue in FIFO order.
///
/// Each executor owns exactly the queue it was given; workers never
/// steal from or observe each other. Every task yields exactly one
/// execution proof on the ledger, and the queue as a whole yields one
/// summary proof whose hash becomes the worker's child proof.
pub struct WorkerExecutor {
    worker: Worker,
    ledger: Arc<dyn ProofLedger>,
    handler: Arc<dyn TaskHandler>,
}

impl WorkerExecutor {
    pub fn new(worker: Worker, ledger: Arc<dyn ProofLedger>, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            worker,
            ledger,
            handler,
        }
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    pub async fn run(&self, queue: Vec<Task>) -> Result<WorkerReport, SwarmError> {
        let mut completed = Vec::new();
        let mut failed = Vec::new();

        for mut task in queue {
            task.status = TaskStatus::Executing;
            match self.handler.execute(&self.worker, &task).await {
                Ok(output) => {
                    task.status = TaskStatus::Complete;
                    self.ledger.append(
                        json!({
                            "worker": self.worker.id,
                            "task": task.id,
                            "status": task.status,
                            "output": output,
                        }),
                        ProofType::Execution,
                    )?;
                    completed.push(task.id);
                }
                Err(failure) => {
                    task.status = TaskStatus::Failed;
                    warn!(worker = %self.worker.id, task = %task.id, error = %failure, "task failed");
                    self.ledger.append(
                        json!({
                            "worker": self.worker.id,
                            "task": task.id,
                            "status": task.status,
                            "error": failure.to_string(),
                        }),
                        ProofType::Execution,
                    )?;
                    failed.push(task.id);
                }
            }
        }

        let summary = self.ledger.append(
            json!({
                "worker": self.worker.id,
                "template": self.worker.template_id,
                "completed": completed,
                "failed": failed,
                "queue_summary": true,
            }),
            ProofType::Execution,
        )?;

        info!(
            worker = %self.worker.id,
            completed = completed.len(),
            failed = failed.len(),
            "worker queue drained"
        );
        Ok(WorkerReport {
            worker_id: self.worker.id.clone(),
            completed,
            failed,
            outcome: ChildProof {
                proof_id: summary.proof_id,
                record_hash: summary.chain_hash,
            },
        })
    }
}
