use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StoreError;
use crate::types::{Embedding, Identity, MatchRecord};

/// Read view of the enrolled identities.
///
/// Implementations must be safe for concurrent use. Enrollment and removal
/// are the store's own concern; the recognition path only reads.
#[async_trait]
pub trait Gallery: Send + Sync {
    /// Returns every enrolled identity. A full, restartable enumeration
    /// per call; the returned snapshot is not torn by concurrent
    /// enrollment.
    async fn scan(&self) -> Result<Vec<Identity>, StoreError>;
}

/// Append-only store of accepted matches.
#[async_trait]
pub trait MatchLedger: Send + Sync {
    async fn append(&self, record: &MatchRecord) -> Result<(), StoreError>;
}

/// In-memory [`Gallery`] implementation.
///
/// Preserves enrollment order (scan order is what breaks candidate ties).
/// Data is lost on restart; suitable for tests and ephemeral deployments.
pub struct MemoryGallery {
    identities: Mutex<Vec<Identity>>,
}

impl MemoryGallery {
    pub fn new() -> Self {
        Self {
            identities: Mutex::new(Vec::new()),
        }
    }

    /// Enrolls an identity; an existing identity with the same id is
    /// replaced in place.
    pub fn enroll(&self, identity: Identity) {
        let mut identities = self.identities.lock().unwrap();
        match identities.iter_mut().find(|i| i.id == identity.id) {
            Some(existing) => *existing = identity,
            None => identities.push(identity),
        }
    }

    /// Adds one embedding to an enrolled identity. Returns false when the
    /// identity is unknown.
    pub fn add_embedding(&self, identity_id: &str, vector: Vec<f32>, filename: &str) -> bool {
        let mut identities = self.identities.lock().unwrap();
        match identities.iter_mut().find(|i| i.id == identity_id) {
            Some(identity) => {
                identity.embeddings.push(Embedding {
                    vector,
                    filename: filename.to_string(),
                    uploaded_at: Utc::now(),
                });
                true
            }
            None => false,
        }
    }

    /// Removes an identity. Returns false when it was not enrolled.
    pub fn remove(&self, identity_id: &str) -> bool {
        let mut identities = self.identities.lock().unwrap();
        let before = identities.len();
        identities.retain(|i| i.id != identity_id);
        identities.len() != before
    }

    pub fn len(&self) -> usize {
        self.identities.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryGallery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gallery for MemoryGallery {
    async fn scan(&self) -> Result<Vec<Identity>, StoreError> {
        Ok(self.identities.lock().unwrap().clone())
    }
}

/// In-memory [`MatchLedger`] implementation.
pub struct MemoryLedger {
    records: Mutex<Vec<MatchRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// All records in append order.
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().unwrap().clone()
    }

    /// The most recent records, newest first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<MatchRecord> {
        let records = self.records.lock().unwrap();
        records.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchLedger for MemoryLedger {
    async fn append(&self, record: &MatchRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
