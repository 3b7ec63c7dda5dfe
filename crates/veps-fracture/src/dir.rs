use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use veps_types::FracturedEvent;

use crate::archive::FractureArchive;
use crate::error::ArchiveResult;
use crate::layout::{date_prefix, group_by_bucket};

/// Archive backed by a local directory tree.
///
/// Objects are plain files under `root`, laid out exactly like the object
/// store (`YYYY/MM/DD/fractures-HH.jsonl`), appended one JSON line per
/// record. This is the reference backend; production deployments point the
/// same layout at an object store.
pub struct LocalDirArchive {
    root: PathBuf,
}

impl LocalDirArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn append_lines(&self, bucket: &str, fractures: &[FracturedEvent]) -> ArchiveResult<()> {
        let path = self.root.join(bucket);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut buffer = Vec::new();
        for fracture in fractures {
            serde_json::to_writer(&mut buffer, fracture)?;
            buffer.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }

    /// Parse one bucket file; a corrupt line fails the whole file so the
    /// caller can decide to skip it.
    async fn read_bucket(&self, path: &Path) -> ArchiveResult<Vec<FracturedEvent>> {
        let content = fs::read_to_string(path).await?;
        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl FractureArchive for LocalDirArchive {
    async fn append(&self, fracture: &FracturedEvent) -> ArchiveResult<()> {
        let bucket = crate::layout::fracture_bucket(fracture);
        self.append_lines(&bucket, std::slice::from_ref(fracture))
            .await
    }

    async fn append_batch(&self, fractures: Vec<FracturedEvent>) -> ArchiveResult<()> {
        // One open per hour bucket.
        for (bucket, group) in group_by_bucket(fractures) {
            self.append_lines(&bucket, &group).await?;
        }
        Ok(())
    }

    async fn read_date(&self, date: NaiveDate) -> ArchiveResult<Vec<FracturedEvent>> {
        let day_dir = self.root.join(date_prefix(date));
        let mut entries = match fs::read_dir(&day_dir).await {
            Ok(entries) => entries,
            // No bucket was ever written for this day.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("fractures-") && name.ends_with(".jsonl") {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut records = Vec::new();
        for path in paths {
            match self.read_bucket(&path).await {
                Ok(mut bucket_records) => records.append(&mut bucket_records),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable bucket");
                }
            }
        }
        Ok(records)
    }
}
