use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gallery_config::CacheSettings;

use crate::cache::TtlCache;
use crate::drive::{ByteStream, DriveError, DriveFile, ImageStore};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One image, normalized for the gallery UI. Both URLs point back at this
/// service's own content endpoint, never at the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub thumbnail_url: String,
    pub created_time: String,
    pub mime_type: String,
    pub size: u64,
}

/// One bounded listing batch plus the continuation token for the next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPage {
    pub images: Vec<ImageRecord>,
    pub next_page_token: Option<String>,
    pub count: usize,
}

/// A listing outcome; `stale` marks a page served from an expired cache
/// entry after the remote fetch failed.
#[derive(Debug, Clone)]
pub struct ListingResult {
    pub page: FolderPage,
    pub stale: bool,
}

/// Cached per-file metadata backing the content endpoint's headers. The
/// fetch timestamp participates in the ETag.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub mime_type: String,
    pub name: String,
    pub size: u64,
    pub fetched_at_ms: i64,
}

/// Listing fetcher and metadata resolver in front of the remote store.
///
/// Listings and single-file metadata are cached with separate TTLs. The two
/// caches fail differently on purpose: a failed metadata fetch invalidates
/// its entry (content must never be served under a stale ETag), while a
/// failed listing fetch falls back to the expired page when one exists.
pub struct GalleryService {
    store: Arc<dyn ImageStore>,
    metadata: TtlCache<FileMetadata>,
    listings: TtlCache<FolderPage>,
    metadata_ttl: Duration,
    listing_ttl: Duration,
}

impl GalleryService {
    pub fn new(store: Arc<dyn ImageStore>, cache: &CacheSettings) -> Self {
        Self {
            store,
            metadata: TtlCache::new(cache.compact_threshold),
            listings: TtlCache::new(cache.compact_threshold),
            metadata_ttl: Duration::from_secs(cache.metadata_ttl_secs),
            listing_ttl: Duration::from_secs(cache.listing_ttl_secs),
        }
    }

    /// Drive file ids are restricted to alphanumerics, hyphen, underscore.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    pub fn etag(id: &str, meta: &FileMetadata) -> String {
        format!("\"{}-{}\"", id, meta.fetched_at_ms)
    }

    fn listing_key(folder_id: &str, page_token: Option<&str>, page_size: u32) -> String {
        format!("{}:{}:{}", folder_id, page_token.unwrap_or(""), page_size)
    }

    /// One page of image files inside `folder_id`, newest first.
    ///
    /// `refresh` drops the cached page before fetching. On a remote failure
    /// the previous page for the same `(folder, token, size)` key is served
    /// marked stale when available.
    pub async fn list_images(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
        refresh: bool,
    ) -> Result<ListingResult, DriveError> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let key = Self::listing_key(folder_id, page_token, page_size);

        if refresh {
            self.listings.invalidate(&key);
        }
        if let Some(page) = self.listings.get(&key) {
            return Ok(ListingResult { page, stale: false });
        }

        match self.store.list_files(folder_id, page_size, page_token).await {
            Ok(list) => {
                let images: Vec<ImageRecord> =
                    list.files.into_iter().map(to_image_record).collect();
                let page = FolderPage {
                    count: images.len(),
                    images,
                    next_page_token: list.next_page_token,
                };
                debug!(folder_id, count = page.count, "cached folder page");
                self.listings.insert(key, page.clone(), self.listing_ttl);
                Ok(ListingResult { page, stale: false })
            }
            Err(err) => {
                if let Some(page) = self.listings.get_stale(&key) {
                    warn!(folder_id, error = %err, "listing fetch failed, serving stale page");
                    return Ok(ListingResult { page, stale: true });
                }
                Err(err)
            }
        }
    }

    /// Normalized record for a single file id, fetched from the remote store.
    pub async fn image_record(&self, id: &str) -> Result<ImageRecord, DriveError> {
        let file = self.store.file_metadata(id).await?;
        Ok(to_image_record(file))
    }

    /// Per-file metadata for the content endpoint, cached under the file id.
    ///
    /// Any fetch failure invalidates the entry so a later request cannot pick
    /// up data from a partially failed attempt.
    pub async fn file_metadata(&self, id: &str) -> Result<FileMetadata, DriveError> {
        if let Some(meta) = self.metadata.get(id) {
            return Ok(meta);
        }

        match self.store.file_metadata(id).await {
            Ok(file) => {
                let meta = FileMetadata {
                    mime_type: if file.mime_type.is_empty() {
                        "image/jpeg".to_string()
                    } else {
                        file.mime_type
                    },
                    name: if file.name.is_empty() {
                        format!("image-{id}")
                    } else {
                        file.name
                    },
                    size: file.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
                    fetched_at_ms: Utc::now().timestamp_millis(),
                };
                self.metadata.insert(id, meta.clone(), self.metadata_ttl);
                Ok(meta)
            }
            Err(err) => {
                self.metadata.invalidate(id);
                Err(err)
            }
        }
    }

    /// Open the remote content stream for `id`. Not cached; dropping the
    /// stream releases the upstream connection.
    pub async fn content_stream(&self, id: &str) -> Result<ByteStream, DriveError> {
        self.store.file_content(id).await
    }
}

fn to_image_record(file: DriveFile) -> ImageRecord {
    let url = format!("/api/drive/image/{}", file.id);
    ImageRecord {
        url: url.clone(),
        thumbnail_url: url,
        name: file.name,
        mime_type: file.mime_type,
        size: file.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
        created_time: file.created_time.unwrap_or_default(),
        id: file.id,
    }
}
