//! Batch orchestration records.
//!
//! An [`OrchestrationRecord`] tracks one dispatched batch: the workers
//! expected to report, the child outcome proofs they produced, and the
//! combined digest that settles the batch. The combined digest exists
//! only once every expected worker has reported; an incomplete batch
//! never carries one.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Digest, ProofId};
use crate::task::WorkerId;

/// Domain separator for the combined child digest.
const ORCHESTRATION_DOMAIN: &[u8] = b"proofspine-orchestration-v1:";

/// Batch identifier supplied by the caller at dispatch time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(pub String);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal and non-terminal batch states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    /// Workers still outstanding; batch is unsettled.
    Open,
    /// All workers reported; aggregate proof emitted.
    Settled,
    /// Timed out with workers missing; recorded as a failure.
    Incomplete,
    /// Cancelled before completion; recorded, never silently dropped.
    Aborted,
}

impl OrchestrationStatus {
    pub fn is_terminal(self) -> bool {
        self != OrchestrationStatus::Open
    }
}

/// One worker's contribution to a batch: its outcome proof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildProof {
    pub proof_id: ProofId,
    pub record_hash: Digest,
}

/// Aggregate state for one dispatched batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRecord {
    pub batch_id: BatchId,
    pub expected_workers: BTreeSet<WorkerId>,
    pub child_proofs: BTreeMap<WorkerId, ChildProof>,
    pub combined_digest: Option<Digest>,
    pub status: OrchestrationStatus,
    pub opened_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl OrchestrationRecord {
    pub fn open(batch_id: BatchId, expected_workers: BTreeSet<WorkerId>) -> Self {
        Self {
            batch_id,
            expected_workers,
            child_proofs: BTreeMap::new(),
            combined_digest: None,
            status: OrchestrationStatus::Open,
            opened_at: Utc::now(),
            settled_at: None,
        }
    }

    /// All expected workers have reported.
    pub fn is_complete(&self) -> bool {
        self.expected_workers
            .iter()
            .all(|worker| self.child_proofs.contains_key(worker))
    }

    /// Expected workers that have not reported yet.
    pub fn missing_workers(&self) -> Vec<WorkerId> {
        self.expected_workers
            .iter()
            .filter(|worker| !self.child_proofs.contains_key(*worker))
            .cloned()
            .collect()
    }
}

/// Combined digest over a set of child proofs.
///
/// Canonical order: child record hashes sorted ascending by byte value.
/// Sorting by hash (not by worker id) makes the digest a pure function
/// of the child proof set, reproducible regardless of arrival order or
/// worker naming.
pub fn combined_digest(children: &BTreeMap<WorkerId, ChildProof>) -> Digest {
    let mut hashes: Vec<&Digest> = children.values().map(|child| &child.record_hash).collect();
    hashes.sort();

    let mut hasher = blake3::Hasher::new();
    hasher.update(ORCHESTRATION_DOMAIN);
    for hash in hashes {
        hasher.update(hash);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(name: &str) -> WorkerId {
        WorkerId(name.to_string())
    }

    fn child(seed: u8) -> ChildProof {
        ChildProof {
            proof_id: ProofId::generate(),
            record_hash: [seed; 32],
        }
    }

    #[test]
    fn completion_tracks_expected_set() {
        let expected: BTreeSet<_> = [worker("w-01"), worker("w-02")].into_iter().collect();
        let mut record = OrchestrationRecord::open(BatchId("B1".into()), expected);

        assert!(!record.is_complete());
        record.child_proofs.insert(worker("w-01"), child(1));
        assert_eq!(record.missing_workers(), vec![worker("w-02")]);

        record.child_proofs.insert(worker("w-02"), child(2));
        assert!(record.is_complete());
        assert!(record.missing_workers().is_empty());
    }

    #[test]
    fn combined_digest_is_arrival_order_independent() {
        let a = child(3);
        let b = child(9);

        let mut first = BTreeMap::new();
        first.insert(worker("w-01"), a.clone());
        first.insert(worker("w-02"), b.clone());

        // Same child hashes attributed to different worker names.
        let mut second = BTreeMap::new();
        second.insert(worker("z-09"), a);
        second.insert(worker("a-00"), b);

        assert_eq!(combined_digest(&first), combined_digest(&second));
    }

    #[test]
    fn combined_digest_changes_with_child_set() {
        let mut children = BTreeMap::new();
        children.insert(worker("w-01"), child(1));
        let one = combined_digest(&children);

        children.insert(worker("w-02"), child(2));
        let two = combined_digest(&children);
        assert_ne!(one, two);
    }
}
