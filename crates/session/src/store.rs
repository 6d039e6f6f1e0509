use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::record::{SessionFile, SessionRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session file is corrupt: {0}")]
    Corrupt(String),
    #[error("failed to encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file holding the [`SessionRecord`].  Every save rewrites the whole
/// file; there is no incremental persistence.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, falling back to a default one when the file is
    /// missing, unreadable, or corrupt.
    ///
    /// A corrupt file is copied to a `.corrupt` sibling before the default is
    /// returned, so the next save does not destroy what was there.
    pub fn load(&self) -> SessionRecord {
        match self.try_load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(path = %self.path.display(), "no session file yet; starting fresh");
                SessionRecord::default()
            }
            Err(err) => {
                warn!(?err, path = %self.path.display(), "session file unusable; starting from a default record");
                if let Err(copy_err) = fs::copy(&self.path, self.sibling("corrupt")) {
                    warn!(?copy_err, "failed to preserve unusable session file");
                }
                SessionRecord::default()
            }
        }
    }

    /// Strict load.  `Ok(None)` means there is no file.
    pub fn try_load(&self) -> Result<Option<SessionRecord>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let file: SessionFile =
            serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let record =
            SessionRecord::try_from(file).map_err(|msg| StoreError::Corrupt(msg.to_string()))?;
        Ok(Some(record))
    }

    /// Atomically replace the session file.
    ///
    /// The record is written to a `.tmp` sibling, `fsync`'d, then renamed
    /// over the original.  A failure at any point before the rename leaves
    /// the previous file untouched.
    pub fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let rendered = serde_json::to_vec_pretty(&SessionFile::from(record))?;
        let tmp_path = self.sibling("tmp");

        let write_result: Result<(), io::Error> = (|| {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&rendered)?;
            file.write_all(b"\n")?;
            file.sync_all()
        })();

        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        Ok(())
    }

    /// Delete the session file.  Missing files are not an error.
    pub fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "session.json".to_string());
        self.path.with_file_name(format!("{filename}.{extension}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecipientId;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_record() -> SessionRecord {
        let mut record = SessionRecord::default();
        record.bind_recipient(RecipientId(7_000_123));
        record.set_topic(
            "오늘은 날씨 얘기 해요",
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        );
        record.push_unsure("이게 무슨 뜻이에요?");
        record.push_unsure("몰라요");
        record
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));
        let record = sample_record();

        store.save(&record).unwrap();
        assert_eq!(store.try_load().unwrap(), Some(record.clone()));
        assert_eq!(store.load(), record);
    }

    #[test]
    fn save_leaves_no_tmp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample_record()).unwrap();
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_state_completely() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample_record()).unwrap();

        let mut emptied = sample_record();
        emptied.take_unsure();
        store.save(&emptied).unwrap();

        assert!(store.load().unsure_queue().is_empty());
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("absent.json"));
        assert!(store.try_load().unwrap().is_none());
        assert_eq!(store.load(), SessionRecord::default());
    }

    #[test]
    fn corrupt_file_falls_back_to_default_and_is_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SessionStore::new(&path);

        assert!(matches!(store.try_load(), Err(StoreError::Corrupt(_))));
        assert_eq!(store.load(), SessionRecord::default());
        let preserved = fs::read_to_string(dir.path().join("session.json.corrupt")).unwrap();
        assert_eq!(preserved, "{ not json");
    }

    #[test]
    fn half_set_topic_on_disk_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"recipient_id": 5, "topic_text": "고아"}"#).unwrap();
        let store = SessionStore::new(&path);

        assert!(matches!(store.try_load(), Err(StoreError::Corrupt(_))));
        assert_eq!(store.load(), SessionRecord::default());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample_record()).unwrap();
        store.remove().unwrap();
        store.remove().unwrap();
        assert!(store.try_load().unwrap().is_none());
    }
}
