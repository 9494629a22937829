use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cv_ranker::ranking::{CandidateRecord, CvSource, SourceError};

/// CV documents stored as JSON files. A record's identifier is its file stem.
#[derive(Debug, Default, Clone)]
pub(crate) struct FileCvSource {
    files: BTreeMap<String, PathBuf>,
}

impl FileCvSource {
    pub(crate) fn from_files(paths: &[PathBuf]) -> Self {
        let mut source = Self::default();
        for path in paths {
            source.insert(path.clone());
        }
        source
    }

    /// Every `*.json` file directly inside `dir`.
    pub(crate) fn from_dir(dir: &Path) -> Result<Self, SourceError> {
        let entries = fs::read_dir(dir).map_err(|err| {
            SourceError::Unavailable(format!("cannot read {}: {err}", dir.display()))
        })?;

        let mut source = Self::default();
        for entry in entries {
            let path = entry
                .map_err(|err| SourceError::Unavailable(err.to_string()))?
                .path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if path.is_file() && is_json {
                source.insert(path);
            }
        }
        Ok(source)
    }

    fn insert(&mut self, path: PathBuf) {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        // Same stem from two directories: fall back to the full path.
        let id = if self.files.contains_key(&stem) {
            path.display().to_string()
        } else {
            stem
        };
        self.files.insert(id, path);
    }
}

impl CvSource for FileCvSource {
    fn list(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn fetch(&self, id: &str) -> Result<CandidateRecord, SourceError> {
        let path = self
            .files
            .get(id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        let text = fs::read_to_string(path).map_err(|err| {
            SourceError::Unavailable(format!("cannot read {}: {err}", path.display()))
        })?;
        let raw = serde_json::from_str(&text).map_err(|err| SourceError::Malformed {
            id: id.to_string(),
            reason: err.to_string(),
        })?;
        Ok(CandidateRecord::new(id, raw))
    }
}
