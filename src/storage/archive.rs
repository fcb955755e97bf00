//! Raw-entry archival.
//!
//! Each acquisition pass is persisted as a timestamp-named JSON file so a
//! run can later be replayed through the classifier without touching the
//! portal. Writes are atomic (temp file, then rename) so a crash never
//! leaves a half-written archive behind.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::RawEntry;

/// Filesystem archive of raw stream entries.
#[derive(Clone)]
pub struct EntryArchive {
    data_dir: PathBuf,
}

impl EntryArchive {
    /// Create an archive rooted at the given directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Persist one pass's entries under a UTC-timestamp filename.
    /// Returns the path written.
    pub async fn save(&self, entries: &[RawEntry]) -> Result<PathBuf> {
        let name = format!("{}.json", Utc::now().format("%Y%m%d%H%M%S"));
        self.save_as(&name, entries).await
    }

    /// Persist entries under an explicit filename.
    pub async fn save_as(&self, name: &str, entries: &[RawEntry]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let path = self.data_dir.join(name);
        let bytes = serde_json::to_vec_pretty(entries)?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;

        Ok(path)
    }

    /// Load a previously archived pass. Output feeds the classifier
    /// identically to freshly fetched entries.
    pub async fn load(path: &Path) -> Result<Vec<RawEntry>> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn entries() -> Vec<RawEntry> {
        serde_json::from_value(json!([
            {
                "se_id": "e1",
                "se_courseId": "_4069_1",
                "se_itemUri": "/webapps/content/item/1",
                "se_unmodeled_field": "kept",
                "itemSpecificData": {
                    "title": "HW1",
                    "notificationDetails": {"actorId": "a1"}
                },
                "extraAttribs": {"event_type": "CO:CO_AVAIL"}
            },
            {
                "se_id": "e2",
                "se_courseId": "_4066_1",
                "itemSpecificData": {
                    "title": "Late",
                    "notificationDetails": {"actorId": "a2"}
                },
                "extraAttribs": {"event_type": "GB:OVERDUE"}
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let archive = EntryArchive::new(tmp.path());

        let original = entries();
        let path = archive.save_as("20200218151412.json", &original).await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let loaded = EntryArchive::load(&path).await.unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded[0].extra.get("se_unmodeled_field").unwrap(), "kept");
    }

    #[tokio::test]
    async fn save_names_file_by_timestamp() {
        let tmp = TempDir::new().unwrap();
        let archive = EntryArchive::new(tmp.path());

        let path = archive.save(&entries()).await.unwrap();
        let name = path.file_stem().unwrap().to_string_lossy();
        assert_eq!(name.len(), 14);
        assert!(name.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn load_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.json");
        assert!(EntryArchive::load(&missing).await.is_err());
    }
}
