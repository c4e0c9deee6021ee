//! HTTP surface for matchbox.
//!
//! Serves boot and provisioning configs to machines in early-boot
//! environments. Every request flows through the same pipeline: the logging
//! middleware assigns a request id, the signature middleware optionally
//! rewrites `.sig`/`.asc` URLs, the context middleware extracts labels and
//! matches a Group/Profile pair, and the role handlers render the bound
//! template with merged metadata.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower::util::BoxCloneService;
use tower::Layer as _;
use tower_http::services::ServeDir;

use matchbox_server::Server;
use matchbox_sign::Signer;

mod context;
mod error;
mod handlers;
mod ignition;
mod labels;
mod logging;
mod metadata;
mod render;
mod signatures;

pub use context::{RequestContext, RequestId, ResolvedContext};
pub use error::HttpError;
pub use ignition::IgnitionError;
pub use labels::{labels_from_query, labels_from_request};
pub use metadata::{deep_merge, merge_metadata, render_env_file};
pub use render::{render, RenderError};

/// Configures the HTTP handler.
pub struct Config {
    pub core: Server,
    /// Directory served under `/assets`, when set.
    pub assets_path: Option<PathBuf>,
    /// Detached-signature signer for `.sig` URLs.
    pub signer: Option<Arc<dyn Signer>>,
    /// Armored-signature signer for `.asc` URLs.
    pub armored_signer: Option<Arc<dyn Signer>>,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) core: Server,
    pub(crate) signer: Option<Arc<dyn Signer>>,
    pub(crate) armored_signer: Option<Arc<dyn Signer>>,
}

/// Assembles the request pipeline: logging and request ids outermost, then
/// signature dispatch (which must rewrite URLs before routing), then the
/// routed handlers with the selection context middleware.
pub fn handler(config: Config) -> BoxCloneService<Request, Response, Infallible> {
    let state = AppState {
        core: config.core,
        signer: config.signer,
        armored_signer: config.armored_signer,
    };

    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route("/boot.ipxe", get(handlers::ipxe_inspect))
        .route("/boot.ipxe.0", get(handlers::ipxe_inspect))
        .route("/ipxe", get(handlers::ipxe))
        .route("/grub", get(handlers::grub))
        .route("/ignition", get(handlers::ignition))
        .route("/template/{selector}", get(handlers::template))
        .route("/metadata", get(handlers::metadata));
    if let Some(assets_path) = config.assets_path {
        router = router.nest_service("/assets", ServeDir::new(assets_path));
    }
    let router = router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            context::select_context,
        ))
        .with_state(state.clone());

    let signed = middleware::from_fn_with_state(state, signatures::dispatch).layer(router);
    let logged = middleware::from_fn(logging::log_requests).layer(signed);
    BoxCloneService::new(logged)
}
