//! Proof Decision Outcome (PDO) - the canonical decision envelope.
//!
//! A PDO binds a decision to its subject, actor, inputs, policy, and
//! observed outcome. PDOs are never edited in place: every lifecycle
//! transition produces a new envelope referencing the prior ledger
//! record via `supersedes`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{content_hash, Digest, ProofId};

/// Lifecycle state of a PDO.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdoState {
    Created,
    Executed,
    Settled,
    Disputed,
    Superseded,
    Archived,
}

impl PdoState {
    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Main line is `Created -> Executed -> Settled`; `Disputed` and
    /// `Superseded` are side branches, `Archived` is terminal.
    pub fn can_transition(self, next: PdoState) -> bool {
        use PdoState::*;
        matches!(
            (self, next),
            (Created, Executed)
                | (Created, Disputed)
                | (Created, Superseded)
                | (Created, Archived)
                | (Executed, Settled)
                | (Executed, Disputed)
                | (Executed, Superseded)
                | (Executed, Archived)
                | (Settled, Disputed)
                | (Settled, Superseded)
                | (Settled, Archived)
                | (Disputed, Superseded)
                | (Disputed, Archived)
                | (Superseded, Archived)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == PdoState::Archived
    }
}

/// Reference to a decision input, hashed so the input set is
/// independently verifiable after the fact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRef {
    pub reference: String,
    pub hash: Digest,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("illegal PDO transition: {from:?} -> {to:?}")]
pub struct PdoTransitionError {
    pub from: PdoState,
    pub to: PdoState,
}

/// The canonical decision envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofDecisionOutcome {
    pub decision_subject: String,
    pub actor: String,
    pub inputs: Vec<InputRef>,
    pub policy_reference: String,
    pub decision: String,
    pub execution_action: Option<String>,
    pub outcome: String,
    pub state: PdoState,
    /// Ledger record this envelope supersedes, if it is a transition.
    pub supersedes: Option<ProofId>,
    pub decided_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub outcome_at: Option<DateTime<Utc>>,
}

impl ProofDecisionOutcome {
    pub fn new(
        decision_subject: impl Into<String>,
        actor: impl Into<String>,
        policy_reference: impl Into<String>,
        decision: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            decision_subject: decision_subject.into(),
            actor: actor.into(),
            inputs: Vec::new(),
            policy_reference: policy_reference.into(),
            decision: decision.into(),
            execution_action: None,
            outcome: outcome.into(),
            state: PdoState::Created,
            supersedes: None,
            decided_at: Utc::now(),
            executed_at: None,
            outcome_at: None,
        }
    }

    pub fn with_input(mut self, reference: impl Into<String>, hash: Digest) -> Self {
        self.inputs.push(InputRef {
            reference: reference.into(),
            hash,
        });
        self
    }

    pub fn with_execution_action(mut self, action: impl Into<String>) -> Self {
        self.execution_action = Some(action.into());
        self
    }

    /// First required field that is missing or empty, if any.
    ///
    /// The enforcement gate turns this into a per-field malformed-proof
    /// denial, so the names here are part of the error surface.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.decision_subject.trim().is_empty() {
            return Some("decision_subject");
        }
        if self.actor.trim().is_empty() {
            return Some("actor");
        }
        if self.policy_reference.trim().is_empty() {
            return Some("policy_reference");
        }
        if self.outcome.trim().is_empty() {
            return Some("outcome");
        }
        None
    }

    /// Content fingerprint used for replay detection.
    pub fn fingerprint(&self) -> Digest {
        // Serializing a well-formed struct to Value cannot fail.
        let value = serde_json::to_value(self).unwrap_or_default();
        content_hash(&value)
    }

    /// Produce the successor envelope for a lifecycle transition.
    ///
    /// The current envelope is left untouched; the successor references
    /// `prior_record` so the chain of custody stays on the ledger.
    pub fn transition(
        &self,
        next: PdoState,
        prior_record: ProofId,
    ) -> Result<Self, PdoTransitionError> {
        if !self.state.can_transition(next) {
            return Err(PdoTransitionError {
                from: self.state,
                to: next,
            });
        }

        let now = Utc::now();
        let mut successor = self.clone();
        successor.state = next;
        successor.supersedes = Some(prior_record);
        match next {
            PdoState::Executed => successor.executed_at = Some(now),
            PdoState::Settled => successor.outcome_at = Some(now),
            _ => {}
        }
        Ok(successor)
    }
}
