use std::collections::HashMap;
use std::sync::RwLock;

use proofspine_types::{AcceptedProof, Digest, ProofId, ACCEPTED_PROOF_KEY};
use tracing::warn;

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// Outcome of a non-mutating replay probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayCheck {
    /// Proof id not seen before.
    Accept,
    /// Same id, same content hash: an exact resubmission.
    Duplicate,
    /// Same id, different content hash: a forgery attempt.
    Collision,
}

/// Tracks every proof id the process has accepted and rejects
/// resubmissions. Collisions are the serious case: the same id
/// arriving with different content means someone is trying to pass
/// new content off under an already-trusted identity.
#[derive(Default)]
pub struct ReplayGuard {
    seen: RwLock<HashMap<ProofId, Digest>>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the seen set from an existing ledger, so restarts do
    /// not reopen the replay window.
    ///
    /// Two sources feed the index: every record's own id, and any
    /// acceptance embedded in an audit payload under
    /// [`ACCEPTED_PROOF_KEY`]. The latter is what keeps submitted
    /// proof ids rejected across restarts; the ledger assigns audit
    /// records fresh ids of its own.
    pub fn from_ledger(reader: &dyn LedgerReader) -> Result<Self, LedgerError> {
        let mut seen = HashMap::new();
        for record in reader.read_all()? {
            if let Some(embedded) = record.payload.get(ACCEPTED_PROOF_KEY) {
                match serde_json::from_value::<AcceptedProof>(embedded.clone()) {
                    Ok(accepted) => {
                        seen.insert(accepted.proof_id, accepted.fingerprint);
                    }
                    Err(error) => {
                        warn!(
                            seq = record.sequence_number,
                            error = %error,
                            "unreadable accepted-proof entry in audit payload"
                        );
                    }
                }
            }
            seen.insert(record.proof_id, record.content_hash);
        }
        Ok(Self {
            seen: RwLock::new(seen),
        })
    }

    /// Probe without admitting. Callers that intend to act on an
    /// `Accept` must use [`ReplayGuard::admit`] instead; two
    /// concurrent probes can both see `Accept` for the same id.
    pub fn check(&self, proof_id: &ProofId, content: &Digest) -> Result<ReplayCheck, LedgerError> {
        let seen = self.seen.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(match seen.get(proof_id) {
            None => ReplayCheck::Accept,
            Some(prior) if prior == content => ReplayCheck::Duplicate,
            Some(_) => ReplayCheck::Collision,
        })
    }

    /// Atomically record the proof id as seen, failing if it already
    /// was. Check and insert happen under one write lock.
    pub fn admit(&self, proof_id: &ProofId, content: &Digest) -> Result<(), LedgerError> {
        let mut seen = self.seen.write().map_err(|_| LedgerError::LockPoisoned)?;
        match seen.get(proof_id) {
            None => {
                seen.insert(proof_id.clone(), *content);
                Ok(())
            }
            Some(prior) if prior == content => Err(LedgerError::DuplicateProof {
                proof_id: proof_id.clone(),
            }),
            Some(_) => {
                warn!(%proof_id, "proof id collision: resubmission with different content");
                Err(LedgerError::ProofCollision {
                    proof_id: proof_id.clone(),
                })
            }
        }
    }

    /// Forget an admitted proof id whose operation never took effect.
    ///
    /// Used when the step after admission fails before anything is
    /// committed, so the caller can resubmit instead of being stuck
    /// behind a replay rejection for an action that never happened.
    pub fn revoke(&self, proof_id: &ProofId) -> Result<(), LedgerError> {
        let mut seen = self.seen.write().map_err(|_| LedgerError::LockPoisoned)?;
        seen.remove(proof_id);
        Ok(())
    }

    /// Number of proof ids currently tracked.
    pub fn tracked(&self) -> Result<usize, LedgerError> {
        let seen = self.seen.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(seen.len())
    }
}
