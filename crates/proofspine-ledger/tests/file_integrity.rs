//! Crash-recovery and tamper-detection tests against the on-disk
//! ledger format.

use proofspine_ledger::{
    FileProofLedger, IntegrityValidator, LedgerConfig, LedgerError, LedgerReader, LedgerWriter,
    ReplayCheck, ReplayGuard,
};
use proofspine_types::ProofType;
use serde_json::json;

fn populate(config: &LedgerConfig, count: usize) {
    let ledger = FileProofLedger::open(config.clone()).unwrap();
    for i in 0..count {
        ledger
            .append(json!({"task": format!("t-{i}")}), ProofType::Execution)
            .unwrap();
    }
}

#[test]
fn validator_accepts_ledger_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::new(dir.path().join("ledger.jsonl"));
    populate(&config, 6);

    let reopened = FileProofLedger::open(config).unwrap();
    let report = IntegrityValidator::validate(&reopened).unwrap();
    assert_eq!(report.records, 6);
    assert_eq!(
        report.last_chain_hash,
        reopened.head().unwrap().unwrap().chain_hash
    );
}

#[test]
fn on_disk_payload_edit_is_reported_at_exact_seq() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let config = LedgerConfig::new(&path);
    populate(&config, 5);

    // Rewrite record 3's payload in place, keeping the stored hashes.
    let mut lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    lines[2]["payload"] = json!({"task": "forged"});
    let rewritten: String = lines
        .iter()
        .map(|value| format!("{value}\n"))
        .collect();
    std::fs::write(&path, rewritten).unwrap();

    let reopened = FileProofLedger::open(config).unwrap();
    let err = IntegrityValidator::validate(&reopened).unwrap_err();
    match err {
        LedgerError::IntegrityViolation { seq, .. } => assert_eq!(seq, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleted_middle_record_breaks_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let config = LedgerConfig::new(&path);
    populate(&config, 4);

    let kept: String = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .enumerate()
        .filter(|(index, _)| *index != 1)
        .map(|(_, line)| format!("{line}\n"))
        .collect();
    std::fs::write(&path, kept).unwrap();

    let reopened = FileProofLedger::open(config).unwrap();
    let err = IntegrityValidator::validate(&reopened).unwrap_err();
    match err {
        LedgerError::IntegrityViolation { seq, reason } => {
            assert_eq!(seq, 2);
            assert!(reason.contains("sequence gap"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn garbled_line_fails_open_with_line_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let config = LedgerConfig::new(&path);
    populate(&config, 2);

    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{not json\n");
    std::fs::write(&path, content).unwrap();

    let err = FileProofLedger::open(config).unwrap_err();
    match err {
        LedgerError::IntegrityViolation { seq, .. } => assert_eq!(seq, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn replay_guard_survives_restart_via_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::new(dir.path().join("ledger.jsonl"));

    let first = {
        let ledger = FileProofLedger::open(config.clone()).unwrap();
        ledger.append(json!({"task": "t-0"}), ProofType::Decision).unwrap()
    };

    let reopened = FileProofLedger::open(config).unwrap();
    let guard = ReplayGuard::from_ledger(&reopened).unwrap();
    assert_eq!(
        guard.check(&first.proof_id, &first.content_hash).unwrap(),
        ReplayCheck::Duplicate
    );
}
