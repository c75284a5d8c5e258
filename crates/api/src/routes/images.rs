use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use gallery_services::GalleryService;
use gallery_services::gallery::DEFAULT_PAGE_SIZE;

use crate::{error::ApiError, state::AppState};

/// Listings change when files land in the folder; cache briefly and let
/// clients revalidate.
const LISTING_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub folder: Option<String>,
    pub page_token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub refresh: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let folder_id = params
        .folder
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| state.settings.drive.folder_id.clone());
    if folder_id.is_empty() {
        return Err(ApiError::Configuration {
            message: "Missing Drive folder id".to_string(),
            details: "Set drive.folder_id (GALLERY__DRIVE__FOLDER_ID) or pass ?folder="
                .to_string(),
        });
    }

    let result = state
        .gallery
        .list_images(
            &folder_id,
            params.page_token.as_deref(),
            params.page_size,
            params.refresh,
        )
        .await?;

    let body = json!({
        "success": true,
        "images": result.page.images,
        "nextPageToken": result.page.next_page_token,
        "count": result.page.count,
        "stale": result.stale,
    });

    Ok((
        [(header::CACHE_CONTROL, LISTING_CACHE_CONTROL)],
        Json(body),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub image_id: String,
}

pub async fn get_one(
    State(state): State<AppState>,
    Json(body): Json<ImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.image_id.is_empty() {
        return Err(ApiError::BadRequest("Image ID is required".to_string()));
    }
    if !GalleryService::is_valid_id(&body.image_id) {
        return Err(ApiError::BadRequest("Invalid image ID format".to_string()));
    }

    let image = state
        .gallery
        .image_record(&body.image_id)
        .await
        .map_err(|e| ApiError::from(e).with_image_id(&body.image_id))?;

    Ok((
        [(header::CACHE_CONTROL, LISTING_CACHE_CONTROL)],
        Json(json!({ "success": true, "image": image })),
    ))
}
