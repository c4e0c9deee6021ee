//! The matchbox daemon: flag parsing, store construction, and the HTTP
//! server with graceful shutdown.

mod options;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::response::Response;
use axum::ServiceExt as _;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::util::BoxCloneService;
use tracing_subscriber::EnvFilter;

use matchbox_http::Config;
use matchbox_server::Server;
use matchbox_sign::{load_signing_key, ArmoredEd25519Signer, Ed25519Signer, Signer};
use matchbox_storage::{
    EtcdStore, EtcdStoreConfig, FileStore, FileStoreConfig, MemoryStore, Store,
};

use options::{Options, StoreBackend};

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let opts = Options::parse();
    init_tracing(&opts.log_level);

    if let Err(err) = run(opts).await {
        tracing::error!(%err, "fatal error");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

async fn run(opts: Options) -> Result<(), Box<dyn std::error::Error>> {
    opts.validate()?;

    let store: Arc<dyn Store> = match opts.store_backend {
        StoreBackend::Filesystem => Arc::new(FileStore::new(FileStoreConfig {
            root: opts.store_filesystem_root.clone(),
        })),
        StoreBackend::Etcd => Arc::new(
            EtcdStore::connect(EtcdStoreConfig {
                endpoints: opts.store_etcd_endpoints.clone(),
                prefix: opts.store_etcd_prefix.clone(),
            })
            .await?,
        ),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    let core = Server::new(store).await;

    let (signer, armored_signer) = match &opts.signature_key {
        Some(path) => {
            let data = std::fs::read(path)?;
            let key = load_signing_key(&data)?;
            (
                Some(Arc::new(Ed25519Signer::new(key.clone())) as Arc<dyn Signer>),
                Some(Arc::new(ArmoredEd25519Signer::new(key)) as Arc<dyn Signer>),
            )
        }
        None => (None, None),
    };

    let app = matchbox_http::handler(Config {
        core,
        assets_path: opts.assets_path.clone(),
        signer,
        armored_signer,
    });

    let listener = TcpListener::bind(&opts.http_address).await?;
    tracing::info!(address = %opts.http_address, "matchbox HTTP server listening");
    serve(listener, app).await
}

/// Serves until SIGINT/SIGTERM, then drains in-flight requests with a
/// deadline.
async fn serve(
    listener: TcpListener,
    app: BoxCloneService<Request, Response, Infallible>,
) -> Result<(), Box<dyn std::error::Error>> {
    let draining = CancellationToken::new();
    let signal_token = draining.clone();
    let server = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            signal_token.cancel();
        },
    );

    tokio::select! {
        result = server => {
            result?;
            tracing::info!("connections drained");
        }
        () = async {
            draining.cancelled().await;
            tokio::time::sleep(DRAIN_DEADLINE).await;
        } => {
            tracing::warn!("drain deadline exceeded, aborting open connections");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, starting graceful shutdown");
}
