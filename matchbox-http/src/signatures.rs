//! Signature dispatch.
//!
//! Requests whose path ends in `.sig` or `.asc` are served the signature of
//! the body the unsuffixed URL would produce: the suffix is stripped before
//! routing, the inner service runs to completion against a buffered body,
//! and the buffered bytes are fed to the configured signer. When the
//! corresponding signer is not configured the URL is left untouched and
//! 404s through normal routing.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;

use matchbox_sign::Signer;

use crate::AppState;

pub(crate) async fn dispatch(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    let (suffix, signer) = if path.ends_with(".sig") {
        (".sig", state.signer.clone())
    } else if path.ends_with(".asc") {
        (".asc", state.armored_signer.clone())
    } else {
        ("", None)
    };
    let Some(signer) = signer else {
        return next.run(req).await;
    };

    *req.uri_mut() = strip_suffix(req.uri(), suffix);
    let response = next.run(req).await;
    sign_response(signer, response).await
}

/// Rebuilds an origin-form URI with the signature suffix removed from the
/// path, preserving the query string.
fn strip_suffix(uri: &Uri, suffix: &str) -> Uri {
    let path = uri.path();
    let stripped = path.strip_suffix(suffix).unwrap_or(path);
    let origin_form = match uri.query() {
        Some(query) => format!("{stripped}?{query}"),
        None => stripped.to_string(),
    };
    origin_form.parse().unwrap_or_else(|_| uri.clone())
}

/// Buffers the inner response and replaces its body with the signature of
/// the buffered bytes. The inner status is preserved; buffering or signing
/// failures are a 500.
async fn sign_response(signer: Arc<dyn Signer>, response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    let buffered = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::error!(%err, "error buffering response body for signing");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    match signer.sign(&buffered) {
        Ok(signature) => {
            // The inner content type and length no longer describe the body.
            parts.headers.remove(header::CONTENT_TYPE);
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(signature))
        }
        Err(err) => {
            tracing::error!(%err, "error signing response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_suffix_preserves_the_query() {
        let uri: Uri = "/ipxe.sig?uuid=a1&mac=x".parse().unwrap();
        let stripped = strip_suffix(&uri, ".sig");
        assert_eq!(stripped.path(), "/ipxe");
        assert_eq!(stripped.query(), Some("uuid=a1&mac=x"));
    }

    #[test]
    fn strip_suffix_without_query() {
        let uri: Uri = "/grub.asc".parse().unwrap();
        assert_eq!(strip_suffix(&uri, ".asc").path(), "/grub");
    }
}
