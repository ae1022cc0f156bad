use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub tx_hash: Option<String>,
}

impl TaskResult {
    pub fn ok(message: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            tx_hash,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            tx_hash: None,
        }
    }
}

/// Append-only sink for generated secrets (one per record).
#[async_trait]
pub trait SecretRecorder: Send + Sync {
    /// Appends one record. Existing records are never rewritten.
    async fn append(&self, secret: &str) -> Result<()>;
}
