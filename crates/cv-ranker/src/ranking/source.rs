use serde::Serialize;
use tracing::warn;

use super::domain::CandidateRecord;

/// Read-only access to candidate documents, so the core never depends on a storage backend.
pub trait CvSource: Send + Sync {
    /// Identifiers of every available record, in a stable order.
    fn list(&self) -> Result<Vec<String>, SourceError>;
    fn fetch(&self, id: &str) -> Result<CandidateRecord, SourceError>;

    /// Every listed record that can be read. Records that fail individually are skipped and
    /// reported; only a failed listing is an error.
    fn load_all(&self) -> Result<LoadedRecords, SourceError> {
        let mut loaded = LoadedRecords::default();
        for id in self.list()? {
            match self.fetch(&id) {
                Ok(record) => loaded.records.push(record),
                Err(err) => {
                    warn!(candidate = %id, error = %err, "skipping unreadable candidate record");
                    loaded.skipped.push(SkippedRecord {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(loaded)
    }
}

/// A record left out of a load, with the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRecords {
    pub records: Vec<CandidateRecord>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("candidate record '{0}' not found")]
    NotFound(String),
    #[error("candidate record '{id}' is malformed: {reason}")]
    Malformed { id: String, reason: String },
    #[error("candidate source unavailable: {0}")]
    Unavailable(String),
}
