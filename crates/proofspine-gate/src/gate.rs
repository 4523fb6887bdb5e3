use std::sync::Arc;

use proofspine_ledger::{LedgerError, ProofLedger, ReplayGuard};
use proofspine_types::{
    AcceptedProof, ProofDecisionOutcome, ProofId, ProofRecord, ProofType, ACCEPTED_PROOF_KEY,
};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{DenialReason, GateError};

/// A proof as submitted by a caller: the envelope plus the identity
/// the caller claims for it. The replay guard is keyed on this id.
#[derive(Clone, Debug)]
pub struct SubmittedProof {
    pub proof_id: ProofId,
    pub pdo: ProofDecisionOutcome,
}

/// A request to perform a protected operation.
#[derive(Clone, Debug)]
pub struct ProtectedRequest {
    pub operation: String,
    pub proof: Option<SubmittedProof>,
}

impl ProtectedRequest {
    pub fn new(operation: impl Into<String>, proof: SubmittedProof) -> Self {
        Self {
            operation: operation.into(),
            proof: Some(proof),
        }
    }

    /// A request arriving with no proof at all. Always blocked; exists
    /// so the denial is recorded rather than the request rejected at
    /// the type level and lost.
    pub fn unproven(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            proof: None,
        }
    }
}

/// Evidence that the gate allowed an operation. The audit record is
/// already on the ledger by the time the token exists.
#[derive(Clone, Debug)]
pub struct AllowToken {
    pub proof_id: ProofId,
    pub audit_record: ProofRecord,
}

/// A blocked operation, with the denial already on the ledger.
#[derive(Clone, Debug)]
pub struct Denial {
    pub reason: DenialReason,
    pub audit_record: ProofRecord,
}

/// Verdict for one protected request.
#[derive(Clone, Debug)]
pub enum GateDecision {
    Allowed(AllowToken),
    Blocked(Denial),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed(_))
    }
}

/// Fail-closed enforcement gate.
///
/// Every protected operation passes through [`EnforcementGate::authorize`];
/// there is no bypass path. Both verdicts are appended to the ledger
/// before they are returned, so the audit trail covers denials as well
/// as approvals. If the ledger cannot record the verdict, the
/// operation does not proceed.
pub struct EnforcementGate {
    ledger: Arc<dyn ProofLedger>,
    replay: Arc<ReplayGuard>,
}

impl EnforcementGate {
    pub fn new(ledger: Arc<dyn ProofLedger>, replay: Arc<ReplayGuard>) -> Self {
        Self { ledger, replay }
    }

    /// Decide whether `request` may proceed.
    ///
    /// An `Err` means the gate itself failed (ledger unavailable) and
    /// must be treated as a block by the caller.
    pub fn authorize(&self, request: &ProtectedRequest) -> Result<GateDecision, GateError> {
        let Some(submitted) = &request.proof else {
            return self.block(request, DenialReason::MissingProof);
        };

        if let Some(field) = submitted.pdo.missing_field() {
            return self.block(request, DenialReason::MalformedProof { field });
        }

        let fingerprint = submitted.pdo.fingerprint();
        match self.replay.admit(&submitted.proof_id, &fingerprint) {
            Ok(()) => {}
            Err(LedgerError::DuplicateProof { proof_id }) => {
                return self.block(request, DenialReason::ReplayDetected { proof_id });
            }
            Err(LedgerError::ProofCollision { proof_id }) => {
                return self.block(request, DenialReason::CollisionDetected { proof_id });
            }
            Err(other) => return Err(other.into()),
        }

        let accepted = AcceptedProof {
            proof_id: submitted.proof_id.clone(),
            fingerprint,
        };
        let audit_record = match self.ledger.append(
            json!({
                "operation": request.operation,
                "verdict": "allowed",
                ACCEPTED_PROOF_KEY: accepted,
                "policy_reference": submitted.pdo.policy_reference,
                "actor": submitted.pdo.actor,
            }),
            ProofType::Decision,
        ) {
            Ok(record) => record,
            Err(error) => {
                // Nothing was committed: free the id so a resubmission
                // is not mistaken for a replay.
                warn!(
                    operation = %request.operation,
                    proof_id = %submitted.proof_id,
                    error = %error,
                    "allow verdict could not be recorded"
                );
                if let Err(revoke_error) = self.replay.revoke(&submitted.proof_id) {
                    warn!(proof_id = %submitted.proof_id, error = %revoke_error, "admission rollback failed");
                }
                return Err(error.into());
            }
        };

        info!(
            operation = %request.operation,
            proof_id = %submitted.proof_id,
            "operation allowed"
        );
        Ok(GateDecision::Allowed(AllowToken {
            proof_id: submitted.proof_id.clone(),
            audit_record,
        }))
    }

    fn block(
        &self,
        request: &ProtectedRequest,
        reason: DenialReason,
    ) -> Result<GateDecision, GateError> {
        let proof_id = request
            .proof
            .as_ref()
            .map(|submitted| submitted.proof_id.clone());
        let audit_record = self.ledger.append(
            json!({
                "operation": request.operation,
                "verdict": "blocked",
                "denial_code": reason.code(),
                "denial": reason.to_string(),
                "proof_id": proof_id,
            }),
            ProofType::Decision,
        )?;

        warn!(
            operation = %request.operation,
            code = reason.code(),
            "operation blocked"
        );
        Ok(GateDecision::Blocked(Denial {
            reason,
            audit_record,
        }))
    }
}
