use axum::extract::{Extension, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::handlers::render_role;
use crate::AppState;

/// Renders the GRUB menu for the requester.
pub(crate) async fn grub(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match render_role(&state, &ctx, "grub").await {
        Ok(rendered) => ([(header::CONTENT_TYPE, "text/plain")], rendered.body).into_response(),
        Err(err) => err.respond(&ctx, "grub"),
    }
}
