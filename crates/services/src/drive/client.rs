use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, Response, StatusCode, header};
use tracing::debug;

use super::auth::CredentialProvider;
use super::{ByteStream, DriveError, DriveFile, DriveFileList, ImageStore};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Drive v3 REST client. All calls go out with a bearer token from the
/// [`CredentialProvider`]; downloads are relayed as streams, never buffered.
pub struct DriveClient {
    http: Client,
    credentials: CredentialProvider,
}

impl DriveClient {
    pub fn new(credentials: CredentialProvider) -> Self {
        Self {
            http: Client::new(),
            credentials,
        }
    }

    /// Map a non-2xx Drive response onto the error taxonomy. Quota
    /// exhaustion surfaces either as 429 or as 403 with a reason string in
    /// the body, so the body has to be inspected before deciding.
    async fn error_for_response(resp: Response) -> DriveError {
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        let body = resp.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => DriveError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => DriveError::RateLimited {
                retry_after_secs: retry_after,
            },
            StatusCode::FORBIDDEN => {
                if body.contains("rateLimitExceeded") || body.contains("quotaExceeded") {
                    DriveError::RateLimited {
                        retry_after_secs: retry_after,
                    }
                } else {
                    DriveError::PermissionDenied
                }
            }
            _ => DriveError::Upstream(format!("drive returned {status}")),
        }
    }
}

#[async_trait]
impl ImageStore for DriveClient {
    async fn list_files(
        &self,
        folder_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, DriveError> {
        let token = self.credentials.token().await?;
        let query = format!(
            "'{folder_id}' in parents and mimeType contains 'image/' and trashed=false"
        );

        let mut req = self
            .http
            .get(DRIVE_FILES_URL)
            .bearer_auth(&token)
            .query(&[
                ("q", query.as_str()),
                (
                    "fields",
                    "nextPageToken, files(id, name, mimeType, size, createdTime)",
                ),
                ("orderBy", "createdTime desc"),
            ])
            .query(&[("pageSize", page_size)]);
        if let Some(t) = page_token {
            req = req.query(&[("pageToken", t)]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DriveError::Upstream(format!("list request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(Self::error_for_response(resp).await);
        }

        let list: DriveFileList = resp
            .json()
            .await
            .map_err(|e| DriveError::Upstream(format!("invalid list response: {e}")))?;
        debug!(folder_id, count = list.files.len(), "listed drive folder");
        Ok(list)
    }

    async fn file_metadata(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        let token = self.credentials.token().await?;
        let resp = self
            .http
            .get(format!("{DRIVE_FILES_URL}/{file_id}"))
            .bearer_auth(&token)
            .query(&[("fields", "id, name, mimeType, size, createdTime")])
            .send()
            .await
            .map_err(|e| DriveError::Upstream(format!("metadata request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(Self::error_for_response(resp).await);
        }

        resp.json()
            .await
            .map_err(|e| DriveError::Upstream(format!("invalid metadata response: {e}")))
    }

    async fn file_content(&self, file_id: &str) -> Result<ByteStream, DriveError> {
        let token = self.credentials.token().await?;
        let resp = self
            .http
            .get(format!("{DRIVE_FILES_URL}/{file_id}"))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| DriveError::Upstream(format!("content request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(Self::error_for_response(resp).await);
        }

        let stream = resp
            .bytes_stream()
            .map_err(|e| DriveError::Upstream(format!("content stream error: {e}")));
        Ok(Box::pin(stream))
    }
}
