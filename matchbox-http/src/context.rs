//! Per-request selection context.
//!
//! The context middleware parses labels, matches a Group, and resolves its
//! Profile before any handler runs. Match failures do not abort the request
//! here; handlers decide by calling [`RequestContext::resolve`].

use std::collections::HashMap;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Map, Value};

use matchbox_storage::{Group, Profile};

use crate::error::HttpError;
use crate::labels::labels_from_request;
use crate::metadata::merge_metadata;
use crate::AppState;

/// A request identifier, echoed from the incoming `X-Request-Id` header or
/// generated as a UUID v4 by the logging middleware.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selection state attached to every request as an extension.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub labels: HashMap<String, String>,
    /// The best-matching Group, when one matched.
    pub group: Option<Group>,
    /// The matched Group's Profile, when it resolved.
    pub profile: Option<Profile>,
}

impl RequestContext {
    /// Resolves the context into the matched pair plus merged metadata, or
    /// the error the handler should serve: `NoMatchingGroup` when nothing
    /// matched, `NoMatchingProfile` when the match dangled.
    pub fn resolve(&self) -> Result<ResolvedContext, HttpError> {
        let group = self.group.clone().ok_or(HttpError::NoMatchingGroup)?;
        let profile = self.profile.clone().ok_or(HttpError::NoMatchingProfile)?;
        let metadata = merge_metadata(&group, &profile, &self.labels);
        Ok(ResolvedContext {
            group,
            profile,
            metadata,
        })
    }
}

/// A fully resolved request: matched resources and the merged metadata
/// document owned by this request alone.
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    pub group: Group,
    pub profile: Profile,
    pub metadata: Map<String, Value>,
}

/// Middleware that builds the [`RequestContext`] for every request.
pub(crate) async fn select_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let labels = labels_from_request(&req);

    let mut ctx = RequestContext {
        request_id,
        labels,
        group: None,
        profile: None,
    };
    if let Ok(group) = state.core.select_group(&ctx.labels).await {
        if let Ok(profile) = state.core.profile_get(&group.profile).await {
            ctx.profile = Some(profile);
        }
        ctx.group = Some(group);
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
