use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use matchbox_server::CoreError;
use matchbox_storage::StoreError;

use crate::context::RequestContext;
use crate::ignition::IgnitionError;
use crate::render::RenderError;

/// Failures in the templated-artifact pipeline.
///
/// Every variant except `Store` is a client-visible 404 with a short reason
/// naming the step that failed and the id it was looking for. Store failures
/// are a 500 with an empty body.
#[derive(Debug)]
pub enum HttpError {
    NoMatchingGroup,
    NoMatchingProfile,
    /// The matched Profile has no template binding for the requested role.
    NoTemplateBinding { role: String, profile: String },
    TemplateNotFound(String),
    TemplateNotUtf8(String),
    Render(RenderError),
    Ignition { template: String, source: IgnitionError },
    Store(StoreError),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::NoMatchingGroup => write!(f, "No matching Group"),
            HttpError::NoMatchingProfile => write!(f, "No matching Profile"),
            HttpError::NoTemplateBinding { role, profile } => {
                write!(f, "template binding for \"{role}\" is not set in Profile {profile}")
            }
            HttpError::TemplateNotFound(id) => write!(f, "No Template found: {id}"),
            HttpError::TemplateNotUtf8(id) => write!(f, "Template {id} is not valid UTF-8"),
            HttpError::Render(err) => write!(f, "error rendering template: {err}"),
            HttpError::Ignition { source, .. } => write!(f, "invalid Ignition config: {source}"),
            HttpError::Store(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Render(err) => Some(err),
            HttpError::Ignition { source, .. } => Some(source),
            HttpError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl HttpError {
    /// Maps a template lookup failure: a typed not-found keeps the id that
    /// was sought, anything else is a backend failure.
    pub(crate) fn from_template_lookup(id: &str, err: CoreError) -> Self {
        match err {
            CoreError::Store(store_err) if store_err.is_not_found() => {
                HttpError::TemplateNotFound(id.to_string())
            }
            CoreError::Store(store_err) => HttpError::Store(store_err),
            // select errors cannot come out of a template get
            CoreError::NoMatchingGroup | CoreError::NoMatchingProfile => {
                HttpError::TemplateNotFound(id.to_string())
            }
        }
    }

    /// The id of the Template involved in the failure, when the pipeline
    /// got far enough to know one.
    fn template_id(&self) -> Option<&str> {
        match self {
            HttpError::TemplateNotFound(id) | HttpError::TemplateNotUtf8(id) => Some(id),
            HttpError::Render(err) => Some(&err.template),
            HttpError::Ignition { template, .. } => Some(template),
            _ => None,
        }
    }

    /// Logs the failure with its request context and converts it into the
    /// response the client sees.
    pub(crate) fn respond(self, ctx: &RequestContext, role: &str) -> Response {
        let group = ctx.group.as_ref().map(|g| g.id.as_str()).unwrap_or("-");
        let profile = ctx.profile.as_ref().map(|p| p.id.as_str()).unwrap_or("-");
        tracing::debug!(
            request_id = %ctx.request_id,
            role,
            labels = ?ctx.labels,
            group,
            profile,
            template = self.template_id().unwrap_or("-"),
            error = %self,
            "request failed",
        );
        self.into_response()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            other => (StatusCode::NOT_FOUND, other.to_string()).into_response(),
        }
    }
}
