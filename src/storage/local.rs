//! Local filesystem storage implementation.
//!
//! Every file is written to a `.tmp` sibling and renamed into place, so a
//! reader racing a sync sees either the previous entry or the new one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Dataset, ResponseFormat};
use crate::storage::{DatasetStorage, WriteMetadata, encode_csv, encode_json, entry_key};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = self.path(&format!("{key}.tmp"));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl DatasetStorage for LocalStorage {
    async fn write_dataset(&self, name: &str, dataset: &Dataset) -> Result<WriteMetadata> {
        let csv = encode_csv(dataset)?;
        let json = encode_json(dataset)?;

        let mut keys = Vec::with_capacity(2);
        for (format, bytes) in [(ResponseFormat::Csv, csv), (ResponseFormat::Json, json)] {
            let key = entry_key(name, format);
            self.write_bytes(&key, &bytes).await?;
            keys.push(key);
        }

        log::info!(
            "Cache: {} rows written to {} in {}",
            dataset.len(),
            keys.join(" and "),
            self.root_dir.display()
        );

        Ok(WriteMetadata {
            rows: dataset.len(),
            keys,
            timestamp: Utc::now(),
        })
    }

    async fn read_entry(&self, name: &str, format: ResponseFormat) -> Result<Option<Vec<u8>>> {
        self.read_bytes(&entry_key(name, format)).await
    }

    async fn modified(&self, name: &str, format: ResponseFormat) -> Result<Option<DateTime<Utc>>> {
        let path = self.path(&entry_key(name, format));
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use tempfile::TempDir;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new(vec![
            "produto".into(),
            "quantidade_l".into(),
            "ano".into(),
            "categoria".into(),
        ]);
        dataset.push_row(vec![
            Value::text("Orgânico"),
            Value::Number(1234567.0),
            Value::Integer(2020),
            Value::text("VINHO DE MESA"),
        ]);
        dataset
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
        let modified = storage.modified("nope", ResponseFormat::Csv).await.unwrap();
        assert!(modified.is_none());
    }

    #[tokio::test]
    async fn test_write_dataset_creates_both_entries() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("cache"));

        let meta = storage.write_dataset("table_production", &sample()).await.unwrap();

        assert_eq!(meta.rows, 1);
        assert_eq!(meta.keys, vec!["table_production.csv", "table_production.json"]);

        let csv = storage
            .read_entry("table_production", ResponseFormat::Csv)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "produto,quantidade_l,ano,categoria\nOrgânico,1234567.0,2020,VINHO DE MESA\n"
        );

        let json = storage
            .read_entry("table_production", ResponseFormat::Json)
            .await
            .unwrap()
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        let record = parsed[0].as_object().unwrap();
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["produto", "quantidade_l", "ano", "categoria"]
        );
        assert_eq!(record["produto"], "Orgânico");
        assert!(String::from_utf8(json).unwrap().contains("Orgânico"));

        assert!(
            storage
                .modified("table_production", ResponseFormat::Json)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_write_dataset_replaces_entry_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_dataset("table_trade", &sample()).await.unwrap();
        let empty = Dataset::new(sample().columns);
        storage.write_dataset("table_trade", &empty).await.unwrap();

        let csv = storage
            .read_entry("table_trade", ResponseFormat::Csv)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(csv, b"produto,quantidade_l,ano,categoria\n");

        let mut names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["table_trade.csv", "table_trade.json"]);
    }
}
