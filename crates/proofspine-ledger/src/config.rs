use std::path::PathBuf;

use crate::error::LedgerError;

/// Environment variable naming the ledger file location.
pub const LEDGER_PATH_ENV: &str = "PROOFSPINE_LEDGER_PATH";

/// Environment variable naming the optional advisory cache manifest.
pub const CACHE_MANIFEST_ENV: &str = "PROOFSPINE_CACHE_MANIFEST";

/// Ledger configuration, constructed at startup and passed down
/// explicitly. Components never read process-wide state themselves.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Path of the newline-delimited record file.
    pub path: PathBuf,
    /// Optional advisory manifest (record count + last chain hash).
    /// Never consulted for integrity decisions.
    pub cache_manifest: Option<PathBuf>,
}

impl LedgerConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_manifest: None,
        }
    }

    pub fn with_cache_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_manifest = Some(path.into());
        self
    }

    /// Build from `PROOFSPINE_LEDGER_PATH` / `PROOFSPINE_CACHE_MANIFEST`.
    pub fn from_env() -> Result<Self, LedgerError> {
        let path = std::env::var_os(LEDGER_PATH_ENV)
            .ok_or(LedgerError::MissingConfig(LEDGER_PATH_ENV))?;
        let mut config = Self::new(PathBuf::from(path));
        if let Some(manifest) = std::env::var_os(CACHE_MANIFEST_ENV) {
            config.cache_manifest = Some(PathBuf::from(manifest));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_manifest() {
        let config = LedgerConfig::new("/var/lib/proofspine/ledger.jsonl")
            .with_cache_manifest("/var/lib/proofspine/manifest.json");
        assert!(config.cache_manifest.is_some());
    }
}
