use crate::{AppState, elapsed::Elapsed, mime, routes::ApiError, storage::FileItem};
use axum::{
    Json,
    extract::{Multipart, State},
};
use axum_extra::extract::WithRejection;
use bytesize::ByteSize;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

const FILES_FIELD: &str = "files";
const PASSWORD_FIELD: &str = "password";
const EXPIRY_FIELD: &str = "expiry";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    success: bool,
    download_code: String,
    download_url: String,
    expiry_date: Option<DateTime<Utc>>,
    file_count: usize,
    total_size: u64,
}

/// Accept a multipart upload made of one or more `files` parts plus optional
/// `password` and `expiry` (in days) text parts.
pub async fn create_upload_handler(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<Json<CreateUploadResponse>, ApiError> {
    let _elapsed = Elapsed::start("Upload");
    let mut items = Vec::new();
    let mut password = None;
    let mut expiry_days = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(FILES_FIELD) => {
                // Checked before the part body is buffered.
                let max_files = state.access.max_files();
                if items.len() >= max_files {
                    debug!("Rejecting upload - more than {max_files} files");
                    return Err(ApiError::BadRequest(format!(
                        "at most {max_files} files can be uploaded at once"
                    )));
                }
                let Some(name) = field.file_name().filter(|name| !name.is_empty()) else {
                    debug!("Rejecting upload - file part has no file name");
                    return Err(ApiError::BadRequest(
                        "uploaded files must have a file name".to_string(),
                    ));
                };
                let name = name.to_string();
                let declared = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                // Unknown types fall back to octet-stream, which still has to be allowed.
                let media_type = mime::resolve_media_type(declared.as_deref(), &name, &bytes);
                if !mime::is_mime_allowed(&media_type, &state.upload_allowed_mimetypes) {
                    debug!("Rejecting upload - MIME type {media_type} is not allowed");
                    return Err(ApiError::UnsupportedMediaType(
                        media_type.essence_str().to_string(),
                    ));
                }
                items.push(FileItem::new(name, media_type.to_string(), bytes));
            }
            Some(PASSWORD_FIELD) => {
                password = Some(field.text().await?);
            }
            Some(EXPIRY_FIELD) => {
                let text = field.text().await?;
                let text = text.trim();
                if !text.is_empty() {
                    expiry_days = Some(text.parse::<u32>().map_err(|_| {
                        ApiError::BadRequest("expiry must be a whole number of days".to_string())
                    })?);
                }
            }
            other => debug!("Ignoring unexpected multipart field {other:?}"),
        }
    }

    let receipt = state.access.upload(items, password, expiry_days)?;
    info!(
        "Created upload {} with {} file(s) totalling {}",
        receipt.code,
        receipt.file_count,
        ByteSize::b(receipt.total_size)
    );
    Ok(Json(CreateUploadResponse {
        success: true,
        download_url: format!(
            "{}/download/{}",
            state.public_url.as_str().trim_end_matches('/'),
            receipt.code
        ),
        download_code: receipt.code,
        expiry_date: receipt.expires_at,
        file_count: receipt.file_count,
        total_size: receipt.total_size,
    }))
}
