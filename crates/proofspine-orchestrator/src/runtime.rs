use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use proofspine_ledger::ProofLedger;
use proofspine_swarm::{DispatchStrategy, Dispatcher, TaskHandler, WorkerExecutor};
use proofspine_types::{Allocation, BatchId, OrchestrationRecord, Task, Worker};
use tracing::{info, warn};

use crate::aggregator::OrchestrationAggregator;
use crate::error::OrchestrationError;

/// Outcome of a full batch run: the allocation the dispatcher chose
/// and the terminal orchestration record.
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    pub allocation: Allocation,
    pub record: OrchestrationRecord,
}

/// Ties the dispatcher, the worker executors, and the aggregator into
/// one batch lifecycle.
pub struct SwarmRuntime {
    ledger: Arc<dyn ProofLedger>,
    aggregator: Arc<OrchestrationAggregator>,
    dispatcher: Dispatcher,
    handler: Arc<dyn TaskHandler>,
}

impl SwarmRuntime {
    pub fn new(
        ledger: Arc<dyn ProofLedger>,
        strategy: DispatchStrategy,
        handler: Arc<dyn TaskHandler>,
    ) -> Self {
        Self {
            aggregator: Arc::new(OrchestrationAggregator::new(ledger.clone())),
            ledger,
            dispatcher: Dispatcher::new(strategy),
            handler,
        }
    }

    pub fn aggregator(&self) -> &Arc<OrchestrationAggregator> {
        &self.aggregator
    }

    /// Dispatch `tasks` across `workers`, run every queue to the end,
    /// and wait for the batch to settle.
    ///
    /// The allocation is fixed before any worker starts. Each worker
    /// runs in its own tokio task; a worker that fails to report
    /// simply stays missing and the batch closes `Incomplete` at the
    /// deadline.
    pub async fn run_batch(
        &self,
        batch_id: BatchId,
        tasks: Vec<Task>,
        workers: Vec<Worker>,
        timeout: Duration,
    ) -> Result<BatchOutcome, OrchestrationError> {
        let allocation = self.dispatcher.dispatch(&tasks, &workers)?;
        let expected: BTreeSet<_> = allocation.assignments.keys().cloned().collect();
        self.aggregator.open_batch(batch_id.clone(), expected)?;

        info!(
            batch = %batch_id,
            tasks = allocation.total_tasks(),
            workers = allocation.worker_count(),
            "batch dispatched"
        );

        let mut runners = Vec::with_capacity(workers.len());
        for worker in workers {
            let queue = allocation.tasks_for(&worker.id).to_vec();
            let executor =
                WorkerExecutor::new(worker, self.ledger.clone(), self.handler.clone());
            let aggregator = self.aggregator.clone();
            let batch = batch_id.clone();

            runners.push(tokio::spawn(async move {
                match executor.run(queue).await {
                    Ok(report) => {
                        if let Err(error) =
                            aggregator.worker_completed(&batch, report.worker_id.clone(), report.outcome)
                        {
                            warn!(batch = %batch, worker = %report.worker_id, error = %error, "worker report rejected");
                        }
                    }
                    Err(error) => {
                        warn!(batch = %batch, error = %error, "worker executor failed");
                    }
                }
            }));
        }

        let record = self.aggregator.await_completion(&batch_id, timeout).await?;

        for runner in runners {
            if let Err(error) = runner.await {
                warn!(batch = %batch_id, error = %error, "worker task panicked");
            }
        }

        Ok(BatchOutcome { allocation, record })
    }
}
