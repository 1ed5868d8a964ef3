mod error;
mod health;
mod statistics;
pub mod uploads;

pub use error::ApiError;
pub use health::*;
pub use statistics::*;

use crate::{AppState, middleware};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{self, TraceLayer},
};
use tracing::Level;

/// Build the full application router around `state`.
pub fn router(state: AppState, upload_limit_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/upload",
            post(
                uploads::create_upload_handler.layer(DefaultBodyLimit::max(upload_limit_bytes)),
            ),
        )
        .route(
            "/api/file/{code}",
            get(uploads::upload_info_handler).delete(uploads::delete_upload_handler),
        )
        .route(
            "/api/verify-password/{code}",
            post(uploads::verify_password_handler),
        )
        .route("/api/stats", get(statistics_handler))
        .route("/download/{code}", get(uploads::download_handler))
        .fallback(error::fallback_handler)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(axum_middleware::from_fn(middleware::header_middleware))
        .with_state(state)
}

#[cfg(all(test, feature = "storage-memory"))]
mod tests {
    use super::*;
    use crate::{
        access::AccessController,
        clock::ManualClock,
        storage::{AppStorage, StorageProvider},
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use chrono::{TimeDelta, Utc};
    use mime_guess::mime;
    use serde_json::Value;
    use std::{str::FromStr, sync::Arc};
    use tower::ServiceExt;
    use url::Url;

    const BOUNDARY: &str = "codedrop-test-boundary";
    const MAX_FILES: usize = 10;

    struct TestApp {
        router: Router,
        clock: Arc<ManualClock>,
    }

    fn app_with(allowed: Vec<mime_guess::Mime>, upload_limit_bytes: usize) -> TestApp {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let storage = Arc::new(AppStorage::new(
            StorageProvider::from_str("memory://").unwrap(),
        ));
        let state = AppState {
            access: AccessController::new(storage, clock.clone(), 7, MAX_FILES),
            public_url: Url::parse("https://drop.example.com/").unwrap(),
            upload_allowed_mimetypes: Arc::new(allowed),
        };
        TestApp {
            router: router(state, upload_limit_bytes),
            clock,
        }
    }

    fn app() -> TestApp {
        app_with(vec![mime::STAR_STAR], 1024 * 1024)
    }

    enum Part<'a> {
        File(&'a str, &'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart(parts: &[Part]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File(name, content_type, content) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(content);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &TestApp, request: Request<Body>) -> Response {
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn upload(app: &TestApp, parts: &[Part<'_>]) -> String {
        let response = send(app, multipart(parts)).await;
        assert_eq!(response.status(), StatusCode::OK);
        json(response).await["downloadCode"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn upload_then_download_single_file() {
        let app = app();
        let response = send(
            &app,
            multipart(&[
                Part::File("hello.txt", "text/plain", b"hello world"),
                Part::Text("password", "p"),
                Part::Text("expiry", "3"),
            ]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-robots-tag"], "none");
        let body = json(response).await;
        let code = body["downloadCode"].as_str().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["fileCount"], 1);
        assert_eq!(body["totalSize"], 11);
        assert_eq!(
            body["downloadUrl"],
            format!("https://drop.example.com/download/{code}")
        );
        assert!(body["expiryDate"].is_string());

        let response = send(&app, request("GET", &format!("/download/{code}"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            request("GET", &format!("/download/{code}?password=nope")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, request("GET", &format!("/download/{code}?password=p"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(
            response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("hello.txt")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn multi_file_download_is_listing() {
        let app = app();
        let code = upload(
            &app,
            &[
                Part::File("a.txt", "text/plain", b"aaa"),
                Part::File("b.csv", "text/csv", b"b,b"),
            ],
        )
        .await;

        let response = send(&app, request("GET", &format!("/download/{code}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["files"][0]["originalName"], "a.txt");
        assert_eq!(body["files"][1]["mimetype"], "text/csv");
        assert_eq!(body["files"][1]["size"], 3);
    }

    #[tokio::test]
    async fn info_hides_password() {
        let app = app();
        let code = upload(
            &app,
            &[
                Part::File("a.txt", "text/plain", b"aaa"),
                Part::Text("password", "secret"),
            ],
        )
        .await;

        let response = send(&app, request("GET", &format!("/api/file/{code}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["hasPassword"], true);
        assert!(body.get("password").is_none());
        assert_eq!(body["files"][0]["originalName"], "a.txt");
        assert!(body["uploadDate"].is_string());
    }

    #[tokio::test]
    async fn verify_password_statuses() {
        let app = app();
        let code = upload(
            &app,
            &[
                Part::File("a.txt", "text/plain", b"aaa"),
                Part::Text("password", "secret"),
            ],
        )
        .await;
        let verify = |password: &str| {
            Request::builder()
                .method("POST")
                .uri(format!("/api/verify-password/{code}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!("{{\"password\":\"{password}\"}}")))
                .unwrap()
        };

        assert_eq!(
            send(&app, verify("wrong")).await.status(),
            StatusCode::UNAUTHORIZED
        );
        let response = send(&app, verify("secret")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["success"], true);
    }

    #[tokio::test]
    async fn verify_password_without_body() {
        let app = app();
        let public = upload(&app, &[Part::File("a.txt", "text/plain", b"aaa")]).await;
        let protected = upload(
            &app,
            &[
                Part::File("a.txt", "text/plain", b"aaa"),
                Part::Text("password", "secret"),
            ],
        )
        .await;

        let response = send(&app, request("POST", &format!("/api/verify-password/{public}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["success"], true);

        let response = send(
            &app,
            Request::builder()
                .method("POST")
                .uri(format!("/api/verify-password/{public}"))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            request("POST", &format!("/api/verify-password/{protected}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["success"], false);
    }

    #[tokio::test]
    async fn rejections_and_unknown_routes_are_json() {
        let app = app();
        let code = upload(&app, &[Part::File("a.txt", "text/plain", b"aaa")]).await;

        let response = send(
            &app,
            request("GET", &format!("/download/{code}?password=a&password=b")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let response = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["success"], false);

        let response = send(&app, request("GET", "/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["success"], false);
    }

    #[tokio::test]
    async fn too_many_files_is_bad_request() {
        let app = app();
        let names: Vec<String> = (0..=MAX_FILES).map(|i| format!("{i}.txt")).collect();
        let parts: Vec<Part> = names
            .iter()
            .map(|name| Part::File(name, "text/plain", b"x"))
            .collect();

        let response = send(&app, multipart(&parts)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["success"], false);

        let response = send(&app, multipart(&parts[..MAX_FILES])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["fileCount"], MAX_FILES);
    }

    #[tokio::test]
    async fn download_keeps_unicode_file_name() {
        let app = app();
        let code = upload(&app, &[Part::File("报告.txt", "text/plain", b"hi")]).await;

        let response = send(&app, request("GET", &format!("/download/{code}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"__.txt\""));
        assert!(disposition.ends_with("filename*=UTF-8''%E6%8A%A5%E5%91%8A.txt"));
    }

    #[tokio::test]
    async fn delete_is_idempotent_over_http() {
        let app = app();
        let code = upload(&app, &[Part::File("a.txt", "text/plain", b"aaa")]).await;

        for _ in 0..2 {
            let response = send(&app, request("DELETE", &format!("/api/file/{code}"))).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = send(&app, request("GET", &format!("/api/file/{code}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["success"], false);
    }

    #[tokio::test]
    async fn expired_upload_is_not_found() {
        let app = app();
        let code = upload(
            &app,
            &[
                Part::File("a.txt", "text/plain", b"aaa"),
                Part::Text("expiry", "1"),
            ],
        )
        .await;
        app.clock.advance(TimeDelta::days(1) + TimeDelta::seconds(1));

        let response = send(&app, request("GET", &format!("/download/{code}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_report_storage_totals() {
        let app = app();
        upload(&app, &[Part::File("a.txt", "text/plain", b"aaaa")]).await;
        upload(&app, &[Part::File("b.txt", "text/plain", b"bb")]).await;

        let response = send(&app, request("GET", "/api/stats")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["totalFiles"], 2);
        assert_eq!(body["totalSize"], 6);
        assert_eq!(body["activeFiles"], 2);
    }

    #[tokio::test]
    async fn upload_rejections() {
        let app = app_with(vec![mime::IMAGE_STAR], 1024);

        let response = send(&app, multipart(&[Part::Text("password", "p")])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            multipart(&[
                Part::File("a.png", "image/png", b"\x89PNG"),
                Part::Text("expiry", "soon"),
            ]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            multipart(&[Part::File("a.txt", "text/plain", b"aaa")]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = send(
            &app,
            multipart(&[Part::File("big.png", "image/png", &[0u8; 4096])]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app();
        let response = send(&app, request("GET", "/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
