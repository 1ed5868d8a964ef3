mod access;
mod clock;
mod elapsed;
mod error;
mod middleware;
mod mime;
mod routes;
mod storage;
mod sweeper;

use access::AccessController;
use anyhow::Result;
use bytesize::ByteSize;
use clap::Parser;
use clap_duration::duration_range_value_parse;
use clock::SystemClock;
use dotenvy::dotenv;
use duration_human::{DurationHuman, DurationHumanValidator};
use mime_guess::Mime;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use storage::{AppStorage, StorageProvider};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[clap(author, about, version)]
struct Arguments {
    /// The socket address that the server should be exposed on.
    #[arg(
        long = "address",
        env = "CODEDROP_ADDRESS",
        default_value = "127.0.0.1:3000"
    )]
    address: SocketAddr,

    /// The public url that this server will be exposed as to the internet.
    ///
    /// Download links handed to uploaders are built on top of this url.
    #[arg(
        long = "public-url",
        env = "CODEDROP_PUBLIC_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    public_url: Url,

    /// Where upload records are kept.
    ///
    /// 'memory://' keeps uploads in memory until they expire or the server stops.
    /// 'demo://' keeps records but replaces every upload with a generated placeholder file.
    #[arg(long = "storage", env = "CODEDROP_STORAGE", default_value = "memory://")]
    storage: StorageProvider,

    /// How many days an upload is kept when the uploader does not choose. 0 keeps it forever.
    #[arg(
        long = "default-expiry-days",
        env = "CODEDROP_DEFAULT_EXPIRY_DAYS",
        default_value_t = 7
    )]
    default_expiry_days: u32,

    /// The interval to run the expiry sweep on.
    ///
    /// Expired uploads are never served regardless of this value; the sweep only reclaims their memory.
    #[clap(long = "sweep-interval", env = "CODEDROP_SWEEP_INTERVAL", default_value="60 min", value_parser = duration_range_value_parse!(min: 1min, max: 1day))]
    sweep_interval: DurationHuman,

    /// The maximum size of a whole upload request.
    #[arg(
        long = "upload-limit",
        env = "CODEDROP_UPLOAD_LIMIT",
        default_value = "10 GiB"
    )]
    upload_limit: ByteSize,

    /// The maximum number of files a single upload may contain.
    #[arg(long = "max-files", env = "CODEDROP_MAX_FILES", default_value_t = 10)]
    max_files: usize,

    /// MIME types that may be uploaded, comma separated. Wildcards such as 'image/*' and '*/*' are supported.
    ///
    /// MIME types are taken from the upload itself, then the file name, then the file's magic numbers.
    #[arg(
        long = "allowed-mimetypes",
        env = "CODEDROP_ALLOWED_MIMETYPES",
        value_delimiter = ',',
        default_value = "*/*"
    )]
    upload_allowed_mimetypes: Vec<Mime>,
}

#[derive(Debug, Clone)]
struct AppState {
    access: AccessController,
    public_url: Url,
    upload_allowed_mimetypes: Arc<Vec<Mime>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")))
        .with_thread_ids(true)
        .init();
    let args = Arguments::parse();

    let storage = Arc::new(AppStorage::new(args.storage));
    let access = AccessController::new(
        storage,
        Arc::new(SystemClock),
        args.default_expiry_days,
        args.max_files,
    );
    let router = routes::router(
        AppState {
            access: access.clone(),
            public_url: args.public_url.clone(),
            upload_allowed_mimetypes: Arc::new(args.upload_allowed_mimetypes),
        },
        usize::try_from(args.upload_limit.as_u64()).unwrap_or(usize::MAX),
    );

    // Expiry background task.
    let shutdown = CancellationToken::new();
    let sweeper = sweeper::spawn_expiry_sweeper(
        access,
        Duration::from(&args.sweep_interval),
        shutdown.clone(),
    );

    // Start webserver.
    let tcp_listener = TcpListener::bind(args.address).await?;
    info!(
        "Internal server listening on http://{} and exposed as {}",
        args.address, args.public_url
    );
    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    sweeper.await?;
    info!("Server stopped - all uploads held in memory have been discarded");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received - stopping server");
}
