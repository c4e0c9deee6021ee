use axum::extract::{Extension, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::handlers::render_role;
use crate::AppState;

/// Renders an arbitrary role taken from the URL path, so Profiles can bind
/// user-defined template roles beyond the built-in ones.
pub(crate) async fn template(
    State(state): State<AppState>,
    Path(selector): Path<String>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match render_role(&state, &ctx, &selector).await {
        Ok(rendered) => ([(header::CONTENT_TYPE, "text/plain")], rendered.body).into_response(),
        Err(err) => err.respond(&ctx, &selector),
    }
}
