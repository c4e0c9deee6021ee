use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use http_body::Body as _;

use crate::context::RequestId;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Outermost middleware: assigns the request id and logs one line per
/// completed request with method, URL, status, body size, duration, and id.
pub(crate) async fn log_requests(mut req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let url = req.uri().clone();

    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }

    let size = response.body().size_hint().exact().unwrap_or(0);
    tracing::info!(
        method = %method,
        url = %url,
        code = response.status().as_u16(),
        size,
        duration = ?start.elapsed(),
        request_id = %request_id,
        "HTTP",
    );
    response
}
