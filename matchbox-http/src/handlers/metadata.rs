use axum::extract::Extension;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::metadata::render_env_file;

/// Serves the merged metadata as a flat `KEY=value` env file. No template
/// is involved; the merged document is serialized directly.
pub(crate) async fn metadata(Extension(ctx): Extension<RequestContext>) -> Response {
    match ctx.resolve() {
        Ok(resolved) => (
            [(header::CONTENT_TYPE, "text/plain")],
            render_env_file(&resolved.metadata),
        )
            .into_response(),
        Err(err) => err.respond(&ctx, "metadata"),
    }
}
