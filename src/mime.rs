use mime_guess::{Mime, mime::APPLICATION_OCTET_STREAM};
use std::str::FromStr;

const WILDCARD: &str = "*";

/// Whether `mime` is covered by any entry of `allowed`, honouring `*/*` and
/// `type/*` wildcards. An empty allow-list permits nothing.
pub fn is_mime_allowed(mime: &Mime, allowed: &[Mime]) -> bool {
    allowed.iter().any(|allowed_mime| {
        match (allowed_mime.type_().as_str(), allowed_mime.subtype().as_str()) {
            (WILDCARD, WILDCARD) => true,
            (_, WILDCARD) => allowed_mime.type_() == mime.type_(),
            _ => allowed_mime.essence_str() == mime.essence_str(),
        }
    })
}

/// Work out the media type of an uploaded file.
///
/// The type declared by the client wins unless it is missing or the generic
/// octet-stream, then the file extension is consulted, then the magic numbers
/// of the content.
pub fn resolve_media_type(declared: Option<&str>, file_name: &str, bytes: &[u8]) -> Mime {
    declared
        .and_then(|declared| Mime::from_str(declared).ok())
        .filter(|mime| mime.essence_str() != APPLICATION_OCTET_STREAM.essence_str())
        .or_else(|| mime_guess::from_path(file_name).first())
        .or_else(|| infer::get(bytes).and_then(|kind| Mime::from_str(kind.mime_type()).ok()))
        .unwrap_or(APPLICATION_OCTET_STREAM)
}
