use crate::{
    AppState,
    access::{Download, RecordInfo},
    routes::ApiError,
    storage::{FileItem, FileItemMetadata},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Bytes left unescaped in an RFC 5987 `filename*` value.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Serialize)]
pub struct UploadInfoResponse {
    success: bool,
    #[serde(flatten)]
    info: RecordInfo,
}

pub async fn upload_info_handler(
    State(state): State<AppState>,
    WithRejection(Path(code), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<UploadInfoResponse>, ApiError> {
    Ok(Json(UploadInfoResponse {
        success: true,
        info: state.access.info(&code)?,
    }))
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    /// Password for protected uploads.
    password: Option<String>,
}

#[derive(Serialize)]
pub struct DownloadListingResponse {
    success: bool,
    files: Vec<FileItemMetadata>,
}

/// Serve the file behind a code as an attachment, or list the files when the
/// upload holds more than one.
pub async fn download_handler(
    State(state): State<AppState>,
    WithRejection(Path(code), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<DownloadQuery>, ApiError>,
) -> Result<Response, ApiError> {
    match state.access.download(&code, query.password.as_deref())? {
        Download::File(item) => Ok(attachment(item)),
        Download::Listing(files) => Ok(Json(DownloadListingResponse {
            success: true,
            files,
        })
        .into_response()),
    }
}

fn attachment(item: FileItem) -> Response {
    let content_type = HeaderValue::try_from(item.media_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&item.name)),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, no-store")),
        ],
        item.content,
    )
        .into_response()
}

/// `attachment` disposition carrying an ASCII `filename` for old clients and
/// the exact UTF-8 name in `filename*`.
fn content_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(name, ATTR_CHAR)
    );
    HeaderValue::try_from(value).unwrap_or(HeaderValue::from_static("attachment"))
}
