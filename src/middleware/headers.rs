use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// Headers attached to every response.
pub async fn header_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::SERVER,
        HeaderValue::from_static(env!("CARGO_PKG_NAME")),
    );
    headers.insert("X-Robots-Tag", HeaderValue::from_static("none"));
    // Uploaded content is served under its declared type and must never be sniffed.
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}
