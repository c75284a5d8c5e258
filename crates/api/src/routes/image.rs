use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::Response,
};
use chrono::Utc;

use gallery_services::GalleryService;

use crate::{error::ApiError, state::AppState};

/// Content is immutable once an id exists; ids are never reused.
const CONTENT_CACHE_CONTROL: &str =
    "public, max-age=31536000, immutable, stale-while-revalidate=86400";

/// Stream one file's content from Drive.
///
/// Request flow: validate the id, resolve metadata (cached), answer
/// conditional requests from the ETag, short-circuit HEAD, and only then
/// open the remote stream and relay it chunk-by-chunk. Dropping the
/// response body (client disconnect) drops the upstream stream with it.
pub async fn content(
    State(state): State<AppState>,
    method: Method,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if !GalleryService::is_valid_id(&id) {
        return Err(ApiError::BadRequest("Invalid image ID format".to_string()));
    }

    let meta = state
        .gallery
        .file_metadata(&id)
        .await
        .map_err(|e| ApiError::from(e).with_image_id(&id))?;
    let etag = GalleryService::etag(&id, &meta);

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if if_none_match == Some(etag.as_str()) {
        return Ok(Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .body(Body::empty())
            .unwrap());
    }

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, &meta.mime_type)
        .header(header::CONTENT_LENGTH, meta.size)
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, CONTENT_CACHE_CONTROL)
        .header(header::ACCEPT_RANGES, "bytes");

    // Probe requests get the full header set and no body, without touching
    // the content endpoint upstream.
    if method == Method::HEAD {
        return Ok(builder.body(Body::empty()).unwrap());
    }

    let stream = state
        .gallery
        .content_stream(&id)
        .await
        .map_err(|e| ApiError::from(e).with_image_id(&id))?;

    Ok(builder
        .header(
            header::LAST_MODIFIED,
            Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        )
        .header(header::VARY, "Accept-Encoding")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", urlencoding::encode(&meta.name)),
        )
        .body(Body::from_stream(stream))
        .unwrap())
}

/// CORS preflight; the cors layer attaches the allow/expose headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
