use crate::error::WalletError;
use crate::traits::SecretRecorder;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Plain-text secret log: one line per record, appended, never deduplicated.
#[derive(Debug)]
pub struct SecretLog {
    path: PathBuf,
    // Serializes appends from concurrent callers so lines never interleave
    write_lock: Mutex<()>,
}

impl SecretLog {
    pub const DEFAULT_FILE: &'static str = "mnemonic.txt";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl SecretRecorder for SecretLog {
    async fn append(&self, secret: &str) -> Result<()> {
        self.append_line(secret.trim()).await.map_err(|e| {
            WalletError::RecordWrite {
                path: self.path.display().to_string(),
                msg: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_one_line_per_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnemonic.txt");
        let log = SecretLog::new(&path);

        log.append("alpha beta gamma").await.unwrap();
        log.append("alpha beta gamma").await.unwrap();
        log.append("delta epsilon").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alpha beta gamma\nalpha beta gamma\ndelta epsilon\n");
    }

    #[tokio::test]
    async fn test_existing_content_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnemonic.txt");
        std::fs::write(&path, "old phrase\n").unwrap();

        SecretLog::new(&path).append("new phrase").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "old phrase\nnew phrase\n");
    }

    #[tokio::test]
    async fn test_unwritable_path_reports_record_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("mnemonic.txt");

        let err = SecretLog::new(&path).append("phrase").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WalletError>(),
            Some(WalletError::RecordWrite { .. })
        ));
    }
}
