//! Fingerprint record store collaborator contract.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::record::Fingerprint;

/// Write-side contract of the fingerprint document store.
///
/// Implementations must enforce `unique(asset_id)`: a second insert for the
/// same asset fails with [`StoreError::Duplicate`] rather than overwriting,
/// which is how concurrent generation attempts for one asset are resolved.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Insert a terminal fingerprint record, returning its id.
    async fn insert(&self, fingerprint: &Fingerprint) -> Result<String, StoreError>;
}

/// In-memory store for tests and the CLI's dry-run mode.
#[derive(Default)]
pub struct MemoryFingerprintStore {
    records: Mutex<HashMap<String, Fingerprint>>,
}

impl MemoryFingerprintStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a record by asset id.
    pub fn get(&self, asset_id: &str) -> Option<Fingerprint> {
        self.records.lock().unwrap().get(asset_id).cloned()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FingerprintStore for MemoryFingerprintStore {
    async fn insert(&self, fingerprint: &Fingerprint) -> Result<String, StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&fingerprint.asset_id) {
            return Err(StoreError::Duplicate(fingerprint.asset_id.clone()));
        }
        debug!(
            asset_id = %fingerprint.asset_id,
            status = ?fingerprint.status,
            "inserted fingerprint record"
        );
        records.insert(fingerprint.asset_id.clone(), fingerprint.clone());
        Ok(fingerprint.id.clone())
    }
}
