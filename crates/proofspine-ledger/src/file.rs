use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use proofspine_types::{
    content_hash, link_hash, Digest, ProofId, ProofRecord, ProofType, GENESIS_CHAIN_HASH,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::traits::{LedgerReader, LedgerWriter};

/// Advisory sidecar summarizing the ledger tail. Written after each
/// durable append when configured; never consulted for integrity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheManifest {
    pub records: u64,
    pub last_chain_hash: Digest,
    pub written_at: DateTime<Utc>,
}

#[derive(Debug)]
struct WriterState {
    file: File,
    next_seq: u64,
    last_chain_hash: Digest,
    last_record: Option<ProofRecord>,
}

/// Durable file-backed proof ledger.
///
/// One JSON record per line. The write path holds the lock across
/// read-latest -> append -> fsync, so sequence numbers and chain links
/// are never raced; readers share a read lock and never observe an
/// in-flight append.
#[derive(Debug)]
pub struct FileProofLedger {
    config: LedgerConfig,
    inner: RwLock<WriterState>,
}

impl FileProofLedger {
    /// Open (or create) the ledger at the configured path and recover
    /// the tail position from the existing records.
    ///
    /// This only recovers `next_seq` and the last chain hash; full
    /// chain verification is the integrity validator's job and must
    /// run before the ledger serves requests.
    pub fn open(config: LedgerConfig) -> Result<Self, LedgerError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let existing = read_records_from(&config)?;
        let next_seq = existing.len() as u64 + 1;
        let last_record = existing.last().cloned();
        let last_chain_hash = last_record
            .as_ref()
            .map(|record| record.chain_hash)
            .unwrap_or(GENESIS_CHAIN_HASH);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        info!(
            path = %config.path.display(),
            records = existing.len(),
            "proof ledger opened"
        );

        Ok(Self {
            config,
            inner: RwLock::new(WriterState {
                file,
                next_seq,
                last_chain_hash,
                last_record,
            }),
        })
    }

    fn write_manifest(&self, records: u64, last_chain_hash: Digest) {
        let Some(manifest_path) = &self.config.cache_manifest else {
            return;
        };
        let manifest = CacheManifest {
            records,
            last_chain_hash,
            written_at: Utc::now(),
        };
        let result = serde_json::to_string_pretty(&manifest)
            .map_err(|error| std::io::Error::other(error.to_string()))
            .and_then(|encoded| std::fs::write(manifest_path, encoded));
        if let Err(error) = result {
            // Advisory only; the ledger itself is already durable.
            warn!(
                path = %manifest_path.display(),
                error = %error,
                "cache manifest write failed"
            );
        }
    }
}

impl LedgerWriter for FileProofLedger {
    fn append(&self, payload: Value, proof_type: ProofType) -> Result<ProofRecord, LedgerError> {
        let mut state = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;

        let content = content_hash(&payload);
        let record = ProofRecord {
            proof_id: ProofId::generate(),
            content_hash: content,
            chain_hash: link_hash(&state.last_chain_hash, &content),
            sequence_number: state.next_seq,
            timestamp: Utc::now(),
            proof_type,
            payload,
        };

        let line =
            serde_json::to_string(&record).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        state.file.write_all(line.as_bytes())?;
        state.file.write_all(b"\n")?;
        // Durable before the lock is released; a buffered write is not
        // an append.
        state.file.sync_all()?;

        state.next_seq += 1;
        state.last_chain_hash = record.chain_hash;
        state.last_record = Some(record.clone());
        let committed = state.next_seq - 1;
        drop(state);

        self.write_manifest(committed, record.chain_hash);

        debug!(
            seq = record.sequence_number,
            proof_type = ?record.proof_type,
            "proof record appended"
        );
        Ok(record)
    }
}

impl LedgerReader for FileProofLedger {
    fn read_all(&self) -> Result<Vec<ProofRecord>, LedgerError> {
        let _guard = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        read_records_from(&self.config)
    }

    fn head(&self) -> Result<Option<ProofRecord>, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.last_record.clone())
    }

    fn len(&self) -> Result<u64, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.next_seq - 1)
    }
}

fn read_records_from(config: &LedgerConfig) -> Result<Vec<ProofRecord>, LedgerError> {
    let file = match File::open(&config.path) {
        Ok(file) => file,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ProofRecord =
            serde_json::from_str(&line).map_err(|error| LedgerError::IntegrityViolation {
                seq: index as u64 + 1,
                reason: format!("unparseable record: {error}"),
            })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_config(dir: &tempfile::TempDir) -> LedgerConfig {
        LedgerConfig::new(dir.path().join("ledger.jsonl"))
    }

    #[test]
    fn append_builds_gapless_chain() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileProofLedger::open(temp_config(&dir)).unwrap();

        let first = ledger
            .append(json!({"subject": "a"}), ProofType::Decision)
            .unwrap();
        let second = ledger
            .append(json!({"subject": "b"}), ProofType::Execution)
            .unwrap();

        assert_eq!(first.sequence_number, 1);
        assert_eq!(second.sequence_number, 2);
        assert_eq!(
            second.chain_hash,
            link_hash(&first.chain_hash, &second.content_hash)
        );
        assert_eq!(
            first.chain_hash,
            link_hash(&GENESIS_CHAIN_HASH, &first.content_hash)
        );
    }

    #[test]
    fn reopen_recovers_tail_position() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        let last_hash = {
            let ledger = FileProofLedger::open(config.clone()).unwrap();
            for i in 0..3 {
                ledger.append(json!({"n": i}), ProofType::Execution).unwrap();
            }
            ledger.head().unwrap().unwrap().chain_hash
        };

        let reopened = FileProofLedger::open(config).unwrap();
        assert_eq!(reopened.len().unwrap(), 3);

        let fourth = reopened
            .append(json!({"n": 3}), ProofType::Execution)
            .unwrap();
        assert_eq!(fourth.sequence_number, 4);
        assert_eq!(fourth.chain_hash, link_hash(&last_hash, &fourth.content_hash));
    }

    #[test]
    fn read_all_returns_records_in_sequence_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileProofLedger::open(temp_config(&dir)).unwrap();
        for i in 0..5 {
            ledger.append(json!({"n": i}), ProofType::Execution).unwrap();
        }

        let records = ledger.read_all().unwrap();
        assert_eq!(records.len(), 5);
        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.sequence_number, index as u64 + 1);
        }
    }

    #[test]
    fn cache_manifest_tracks_tail() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("manifest.json");
        let config = temp_config(&dir).with_cache_manifest(&manifest_path);
        let ledger = FileProofLedger::open(config).unwrap();

        let record = ledger.append(json!({"n": 1}), ProofType::Decision).unwrap();

        let manifest: CacheManifest =
            serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!(manifest.records, 1);
        assert_eq!(manifest.last_chain_hash, record.chain_hash);
    }

    #[test]
    fn empty_ledger_has_no_head() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileProofLedger::open(temp_config(&dir)).unwrap();
        assert!(ledger.is_empty().unwrap());
        assert!(ledger.head().unwrap().is_none());
    }
}
