use proofspine_types::{Allocation, Task, TaskStatus, Worker};
use tracing::debug;

use crate::error::SwarmError;

/// How tasks map onto the worker roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Task at position `i` goes to worker `i % N`. Balanced, but a
    /// task's placement depends on its position in the batch.
    RoundRobin,
    /// Worker chosen from a stable hash of the task id. A task lands
    /// on the same worker regardless of what else is in the batch,
    /// as long as the roster is unchanged.
    HashModulo,
}

/// Stable 64-bit slot for a task id. Derived from the task id alone,
/// so it never varies across processes or restarts.
pub fn stable_task_slot(task_id: &str) -> u64 {
    let digest = blake3::hash(task_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Deterministic task dispatcher.
///
/// Given the same tasks, roster, and strategy, dispatch always
/// produces the same allocation. Placement indexes the roster exactly
/// as the caller supplies it; roster order is part of the dispatch
/// input, not something the dispatcher normalizes away.
pub struct Dispatcher {
    strategy: DispatchStrategy,
}

impl Dispatcher {
    pub fn new(strategy: DispatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> DispatchStrategy {
        self.strategy
    }

    /// Assign every task to exactly one worker. Every worker appears
    /// in the allocation, with an empty queue if nothing landed on it.
    pub fn dispatch(&self, tasks: &[Task], workers: &[Worker]) -> Result<Allocation, SwarmError> {
        if workers.is_empty() {
            return Err(SwarmError::EmptyRoster);
        }

        let mut allocation = Allocation::default();
        for worker in workers {
            allocation.assignments.entry(worker.id.clone()).or_default();
        }

        for (index, task) in tasks.iter().enumerate() {
            let slot = match self.strategy {
                DispatchStrategy::RoundRobin => index as u64 % workers.len() as u64,
                DispatchStrategy::HashModulo => stable_task_slot(&task.id) % workers.len() as u64,
            };
            let worker = &workers[slot as usize];

            let mut assigned = task.clone();
            assigned.status = TaskStatus::Assigned;
            assigned.assigned_to = Some(worker.id.clone());
            debug!(task = %task.id, worker = %worker.id, "task assigned");

            allocation
                .assignments
                .entry(worker.id.clone())
                .or_default()
                .push(assigned);
        }

        Ok(allocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofspine_types::{WorkerCapability, WorkerId, WorkerTemplate};
    use proptest::prelude::*;
    use serde_json::json;

    fn workers(count: u32) -> Vec<Worker> {
        let template = WorkerTemplate::new(
            "executor",
            "Task Executor",
            vec![WorkerCapability::TaskExecution],
        );
        (1..=count)
            .map(|ordinal| Worker::clone_from(&template, ordinal))
            .collect()
    }

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter()
            .map(|id| Task::new(*id, format!("work {id}"), json!({})))
            .collect()
    }

    #[test]
    fn round_robin_strides_across_roster() {
        let dispatcher = Dispatcher::new(DispatchStrategy::RoundRobin);
        let allocation = dispatcher
            .dispatch(
                &tasks(&["T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8", "T9"]),
                &workers(3),
            )
            .unwrap();

        let ids_for = |worker: &str| -> Vec<String> {
            allocation
                .tasks_for(&WorkerId(worker.into()))
                .iter()
                .map(|task| task.id.clone())
                .collect()
        };
        assert_eq!(ids_for("executor-01"), vec!["T1", "T4", "T7"]);
        assert_eq!(ids_for("executor-02"), vec!["T2", "T5", "T8"]);
        assert_eq!(ids_for("executor-03"), vec!["T3", "T6", "T9"]);
    }

    #[test]
    fn dispatch_marks_tasks_assigned() {
        let dispatcher = Dispatcher::new(DispatchStrategy::RoundRobin);
        let allocation = dispatcher.dispatch(&tasks(&["T1", "T2"]), &workers(2)).unwrap();

        for (worker, assigned) in &allocation.assignments {
            for task in assigned {
                assert_eq!(task.status, TaskStatus::Assigned);
                assert_eq!(task.assigned_to.as_ref(), Some(worker));
            }
        }
    }

    #[test]
    fn hash_modulo_placement_survives_batch_changes() {
        let dispatcher = Dispatcher::new(DispatchStrategy::HashModulo);
        let roster = workers(3);

        let full = dispatcher
            .dispatch(&tasks(&["T1", "T2", "T3", "T4", "T5"]), &roster)
            .unwrap();
        let without_t5 = dispatcher
            .dispatch(&tasks(&["T1", "T2", "T3", "T4"]), &roster)
            .unwrap();

        let placement = |allocation: &Allocation, task_id: &str| -> Option<WorkerId> {
            allocation
                .assignments
                .iter()
                .find(|(_, assigned)| assigned.iter().any(|task| task.id == task_id))
                .map(|(worker, _)| worker.clone())
        };

        for id in ["T1", "T2", "T3", "T4"] {
            assert_eq!(placement(&full, id), placement(&without_t5, id));
        }
    }

    #[test]
    fn round_robin_follows_caller_roster_order() {
        let dispatcher = Dispatcher::new(DispatchStrategy::RoundRobin);
        let mut roster = workers(3);
        roster.reverse();

        let allocation = dispatcher
            .dispatch(&tasks(&["T1", "T2", "T3"]), &roster)
            .unwrap();

        let assigned_to = |task_id: &str| -> WorkerId {
            allocation
                .assignments
                .iter()
                .find(|(_, assigned)| assigned.iter().any(|task| task.id == task_id))
                .map(|(worker, _)| worker.clone())
                .unwrap()
        };
        // Position 0 maps to the first roster entry as supplied.
        assert_eq!(assigned_to("T1"), WorkerId("executor-03".into()));
        assert_eq!(assigned_to("T2"), WorkerId("executor-02".into()));
        assert_eq!(assigned_to("T3"), WorkerId("executor-01".into()));
    }

    #[test]
    fn empty_roster_is_rejected() {
        let dispatcher = Dispatcher::new(DispatchStrategy::HashModulo);
        let err = dispatcher.dispatch(&tasks(&["T1"]), &[]).unwrap_err();
        assert!(matches!(err, SwarmError::EmptyRoster));
    }

    #[test]
    fn idle_workers_still_appear_in_allocation() {
        let dispatcher = Dispatcher::new(DispatchStrategy::RoundRobin);
        let allocation = dispatcher.dispatch(&tasks(&["T1"]), &workers(3)).unwrap();
        assert_eq!(allocation.worker_count(), 3);
        assert_eq!(allocation.total_tasks(), 1);
    }

    proptest! {
        #[test]
        fn dispatch_is_deterministic(
            task_ids in proptest::collection::vec("[a-z0-9]{1,12}", 0..40),
            worker_count in 1u32..8,
            use_hash in any::<bool>(),
        ) {
            let strategy = if use_hash {
                DispatchStrategy::HashModulo
            } else {
                DispatchStrategy::RoundRobin
            };
            let dispatcher = Dispatcher::new(strategy);
            let batch: Vec<Task> = task_ids
                .iter()
                .map(|id| Task::new(id.clone(), "generated", json!({})))
                .collect();
            let roster = workers(worker_count);

            let first = dispatcher.dispatch(&batch, &roster).unwrap();
            let second = dispatcher.dispatch(&batch, &roster).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.total_tasks(), batch.len());
        }
    }
}
