use axum::extract::{Extension, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::handlers::render_role;
use crate::AppState;

const IPXE_BOOTSTRAP: &str = "#!ipxe\nchain ipxe?uuid=${uuid}&mac=${mac:hexhyp}&domain=${domain}&hostname=${hostname}&serial=${serial}\n";

/// Serves the static iPXE script that gathers client machine data and
/// chainloads to [`ipxe`].
pub(crate) async fn ipxe_inspect() -> &'static str {
    IPXE_BOOTSTRAP
}

/// Renders the iPXE boot script for the requester.
pub(crate) async fn ipxe(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match render_role(&state, &ctx, "ipxe").await {
        Ok(rendered) => ([(header::CONTENT_TYPE, "text/plain")], rendered.body).into_response(),
        Err(err) => err.respond(&ctx, "ipxe"),
    }
}
