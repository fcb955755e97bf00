// src/services/sink.rs

//! Task sink boundary.
//!
//! The dispatcher hands finished alerts to a sink as (title, note) pairs,
//! fire-and-forget. The shipped implementation appends JSONL records to a
//! local inbox file; an external task manager can tail or import it.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Destination for task items produced from alerts.
#[async_trait]
pub trait TaskSink {
    /// Add one task item. No acknowledgment is required by the core.
    async fn add_item(&self, title: &str, note: &str) -> Result<()>;
}

/// Appends task items to a JSONL inbox file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaskSink for JsonlSink {
    async fn add_item(&self, title: &str, note: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let record = serde_json::json!({
            "title": title,
            "note": note,
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{record}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn appends_one_record_per_item() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inbox.jsonl");
        let sink = JsonlSink::new(&path);

        sink.add_item("CALC: HW1 available", "See course page")
            .await
            .unwrap();
        sink.add_item("PHYS: announcement", "Lab moved").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["title"], "CALC: HW1 available");
        assert_eq!(first["note"], "See course page");
        assert!(first["created_at"].is_string());
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/inbox.jsonl");
        let sink = JsonlSink::new(&path);

        sink.add_item("t", "n").await.unwrap();
        assert!(path.exists());
    }
}
