pub mod auth;
pub mod client;

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Drive configuration error: {0}")]
    Configuration(String),
    #[error("File not found")]
    NotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

/// One file as returned by the Drive v3 API. Only the fields we request;
/// Drive reports `size` as a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Chunked file content relayed from the remote store. Dropping the stream
/// releases the upstream connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DriveError>> + Send>>;

/// Read-only surface of the remote file store.
///
/// Implemented by [`client::DriveClient`] against the real Drive API; tests
/// substitute an in-memory fake to count calls and inject failures.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// List image files inside `folder_id`, newest first.
    async fn list_files(
        &self,
        folder_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, DriveError>;

    /// Metadata for a single file id.
    async fn file_metadata(&self, file_id: &str) -> Result<DriveFile, DriveError>;

    /// File content as a byte stream.
    async fn file_content(&self, file_id: &str) -> Result<ByteStream, DriveError>;
}
