use axum::extract::{Extension, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::error::HttpError;
use crate::handlers::render_role;
use crate::{ignition as ignition_config, AppState};

/// Renders the Ignition config for the requester. The rendered bytes must
/// parse as Ignition JSON; anything else fails the request.
pub(crate) async fn ignition(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let result = render_role(&state, &ctx, "ignition")
        .await
        .and_then(|rendered| match ignition_config::validate(rendered.body.as_bytes()) {
            Ok(()) => Ok(rendered.body),
            Err(source) => Err(HttpError::Ignition {
                template: rendered.template,
                source,
            }),
        });
    match result {
        Ok(body) => (
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => err.respond(&ctx, "ignition"),
    }
}
