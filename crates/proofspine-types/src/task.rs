//! Tasks, worker templates, and deterministic worker clones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of a worker clone, e.g. `auditor-02`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    Executing,
    Complete,
    Failed,
}

/// One unit of work in a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub payload: Value,
    pub status: TaskStatus,
    pub assigned_to: Option<WorkerId>,
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            payload,
            status: TaskStatus::Pending,
            assigned_to: None,
        }
    }
}

/// Closed set of capabilities a worker template can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCapability {
    TaskExecution,
    AuditReview,
    SettlementPrep,
    ComplianceCheck,
}

/// Named template a worker clone inherits its role and capabilities from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerTemplate {
    pub id: String,
    pub role: String,
    pub capabilities: Vec<WorkerCapability>,
}

impl WorkerTemplate {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        capabilities: Vec<WorkerCapability>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            capabilities,
        }
    }
}

/// A worker instantiated from a template.
///
/// Identity is `{template-id}-{ordinal:02}`, so spawning the same
/// template with the same count always yields the same set of
/// identities. Instantiation is a pure function of (template, ordinal).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub template_id: String,
    pub ordinal: u32,
    pub role: String,
    pub capabilities: Vec<WorkerCapability>,
}

impl Worker {
    pub fn clone_from(template: &WorkerTemplate, ordinal: u32) -> Self {
        Self {
            id: WorkerId(format!("{}-{:02}", template.id, ordinal)),
            template_id: template.id.clone(),
            ordinal,
            role: template.role.clone(),
            capabilities: template.capabilities.clone(),
        }
    }
}

/// Mapping from worker to assigned tasks, as produced by the dispatcher.
///
/// Backed by a `BTreeMap` so iteration (and serialization) order is
/// deterministic across runs and restarts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub assignments: BTreeMap<WorkerId, Vec<Task>>,
}

impl Allocation {
    pub fn tasks_for(&self, worker: &WorkerId) -> &[Task] {
        self.assignments
            .get(worker)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_tasks(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }

    pub fn worker_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clone_identity_is_deterministic() {
        let template = WorkerTemplate::new(
            "auditor",
            "Security Auditor",
            vec![WorkerCapability::AuditReview],
        );

        let first = Worker::clone_from(&template, 1);
        let again = Worker::clone_from(&template, 1);
        assert_eq!(first, again);
        assert_eq!(first.id, WorkerId("auditor-01".into()));

        let twelfth = Worker::clone_from(&template, 12);
        assert_eq!(twelfth.id, WorkerId("auditor-12".into()));
        assert_eq!(twelfth.role, template.role);
        assert_eq!(twelfth.capabilities, template.capabilities);
    }

    #[test]
    fn new_task_starts_pending_and_unassigned() {
        let task = Task::new("T1", "verify corridor", json!({"n": 1}));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.assigned_to, None);
    }
}
