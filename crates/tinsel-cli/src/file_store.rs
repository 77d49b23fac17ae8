//! Directory-backed exchange history.
//!
//! One `<id>.cbor` file per exchange. Writes go to a temporary file first and
//! are renamed into place, so a crash mid-save never leaves a truncated
//! snapshot behind.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tinsel_core::{ExchangeId, ExchangeSnapshot, ExchangeStore, StoreError};

const EXTENSION: &str = "cbor";

/// Exchange history stored in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the snapshots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: ExchangeId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }
}

impl ExchangeStore for FileStore {
    fn save(&self, snapshot: &ExchangeSnapshot) -> Result<(), StoreError> {
        let bytes = snapshot.to_cbor()?;
        let path = self.path(snapshot.id);
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(id = %snapshot.id, path = %path.display(), "snapshot saved");
        Ok(())
    }

    fn load(&self, id: ExchangeId) -> Result<Option<ExchangeSnapshot>, StoreError> {
        match fs::read(self.path(id)) {
            Ok(bytes) => ExchangeSnapshot::from_cbor(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<ExchangeId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // Foreign files in the directory are skipped, not errors
            if let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn delete(&self, id: ExchangeId) -> Result<bool, StoreError> {
        match fs::remove_file(self.path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
