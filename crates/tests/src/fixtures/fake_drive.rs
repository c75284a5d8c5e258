use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use gallery_services::drive::{ByteStream, DriveError, DriveFile, DriveFileList, ImageStore};

#[derive(Clone)]
pub struct FakeFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub content: Bytes,
}

#[derive(Clone, Copy, Debug)]
pub enum FakeFailure {
    NotFound,
    PermissionDenied,
    RateLimited,
    Upstream,
}

impl FakeFailure {
    fn into_error(self) -> DriveError {
        match self {
            FakeFailure::NotFound => DriveError::NotFound,
            FakeFailure::PermissionDenied => DriveError::PermissionDenied,
            FakeFailure::RateLimited => DriveError::RateLimited {
                retry_after_secs: 60,
            },
            FakeFailure::Upstream => DriveError::Upstream("injected failure".to_string()),
        }
    }
}

/// In-memory stand-in for the Drive API. Counts every call per operation,
/// injects failures on demand, and flags when a handed-out content stream
/// is dropped (cancellation tests).
#[derive(Default)]
pub struct FakeDrive {
    files: Mutex<Vec<FakeFile>>,
    pub list_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
    list_failure: Mutex<Option<FakeFailure>>,
    metadata_failure: Mutex<Option<FakeFailure>>,
    pub stream_dropped: Arc<AtomicBool>,
    endless_content: AtomicBool,
}

impl FakeDrive {
    pub fn add_image(&self, id: &str, name: &str, mime_type: &str, content: &[u8]) {
        self.files.lock().unwrap().push(FakeFile {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            content: Bytes::copy_from_slice(content),
        });
    }

    pub fn fail_listings(&self, failure: Option<FakeFailure>) {
        *self.list_failure.lock().unwrap() = failure;
    }

    pub fn fail_metadata(&self, failure: Option<FakeFailure>) {
        *self.metadata_failure.lock().unwrap() = failure;
    }

    /// Make content streams trickle chunks forever so a client can cancel
    /// mid-transfer; metadata reports a matching oversized length.
    pub fn set_endless_content(&self, on: bool) {
        self.endless_content.store(on, Ordering::SeqCst);
    }

    fn find(&self, file_id: &str) -> Option<FakeFile> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == file_id)
            .cloned()
    }
}

#[async_trait]
impl ImageStore for FakeDrive {
    async fn list_files(
        &self,
        _folder_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, DriveError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.list_failure.lock().unwrap() {
            return Err(failure.into_error());
        }

        let files = self.files.lock().unwrap().clone();
        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (start + page_size as usize).min(files.len());
        let page = files[start.min(end)..end]
            .iter()
            .map(|f| DriveFile {
                id: f.id.clone(),
                name: f.name.clone(),
                mime_type: f.mime_type.clone(),
                size: Some(f.content.len().to_string()),
                created_time: Some("2025-06-01T12:00:00.000Z".to_string()),
            })
            .collect();
        let next_page_token = (end < files.len()).then(|| end.to_string());

        Ok(DriveFileList {
            files: page,
            next_page_token,
        })
    }

    async fn file_metadata(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.metadata_failure.lock().unwrap() {
            return Err(failure.into_error());
        }

        let file = self.find(file_id).ok_or(DriveError::NotFound)?;
        let size = if self.endless_content.load(Ordering::SeqCst) {
            10_000_000
        } else {
            file.content.len()
        };
        Ok(DriveFile {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: Some(size.to_string()),
            created_time: Some("2025-06-01T12:00:00.000Z".to_string()),
        })
    }

    async fn file_content(&self, file_id: &str) -> Result<ByteStream, DriveError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);

        let inner: ByteStream = if self.endless_content.load(Ordering::SeqCst) {
            Box::pin(futures::stream::unfold((), |()| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                static CHUNK: [u8; 1024] = [0; 1024];
                Some((Ok(Bytes::from_static(&CHUNK)), ()))
            }))
        } else {
            let file = self.find(file_id).ok_or(DriveError::NotFound)?;
            Box::pin(futures::stream::once(async move { Ok(file.content) }))
        };

        Ok(Box::pin(SignalOnDrop {
            inner,
            dropped: self.stream_dropped.clone(),
        }))
    }
}

/// Flags its shared marker when the stream is dropped, so tests can observe
/// that cancelling the outbound response released the upstream stream.
struct SignalOnDrop {
    inner: ByteStream,
    dropped: Arc<AtomicBool>,
}

impl Stream for SignalOnDrop {
    type Item = Result<Bytes, DriveError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl Drop for SignalOnDrop {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}
