use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 32-byte blake3 digest.
pub type Digest = [u8; 32];

/// The genesis record links to an all-zero previous chain hash.
pub const GENESIS_CHAIN_HASH: Digest = [0u8; 32];

/// Domain separator for record content hashing.
const RECORD_DOMAIN: &[u8] = b"proofspine-record-v1:";

/// Globally unique proof record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProofId(pub Uuid);

impl ProofId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ProofId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag distinguishing the kinds of records the ledger carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofType {
    /// A gate decision (allow or deny) over a protected action.
    Decision,
    /// A worker's per-task or per-batch execution outcome.
    Execution,
    /// An artifact reference (exports, generated documents).
    Artifact,
    /// The aggregate record settling a multi-worker batch.
    Orchestration,
}

/// One immutable, hash-linked entry in the proof ledger.
///
/// Invariants (enforced by the ledger write path and re-checked by the
/// integrity validator):
/// - `content_hash = blake3(domain || canonical_json(payload))`
/// - `chain_hash[n] = blake3(chain_hash[n-1] || content_hash[n])`,
///   with `chain_hash[-1] = GENESIS_CHAIN_HASH`
/// - `sequence_number` is gapless and starts at 1
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub proof_id: ProofId,
    pub content_hash: Digest,
    pub chain_hash: Digest,
    pub sequence_number: u64,
    pub timestamp: DateTime<Utc>,
    pub proof_type: ProofType,
    pub payload: Value,
}

impl ProofRecord {
    /// Recompute the content hash from the stored payload and compare.
    pub fn verify_content(&self) -> bool {
        content_hash(&self.payload) == self.content_hash
    }
}

/// Payload key under which an allow verdict embeds the identity of the
/// proof it accepted.
pub const ACCEPTED_PROOF_KEY: &str = "accepted_proof";

/// Identity of a proof accepted at the enforcement boundary.
///
/// Ledger records carry their own generated ids, so an acceptance must
/// be written into the audit payload under [`ACCEPTED_PROOF_KEY`] to be
/// recoverable: the replay index is rebuilt from these entries after a
/// restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptedProof {
    pub proof_id: ProofId,
    pub fingerprint: Digest,
}

/// Canonical content hash of a structured payload.
///
/// `serde_json::Value` maps are BTreeMap-backed, so re-serializing a
/// `Value` always emits object keys in sorted order. That default is a
/// contract here: the `preserve_order` feature must never be enabled,
/// or previously written chains become unverifiable.
pub fn content_hash(payload: &Value) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(RECORD_DOMAIN);
    hasher.update(payload.to_string().as_bytes());
    *hasher.finalize().as_bytes()
}

/// Chain link hash: previous chain hash concatenated with the current
/// record's content hash.
pub fn link_hash(prev_chain: &Digest, content: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prev_chain);
    hasher.update(content);
    *hasher.finalize().as_bytes()
}
