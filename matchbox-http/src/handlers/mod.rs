//! Role handlers.
//!
//! Every templated role shares one pipeline: resolve the request context,
//! look up the Profile's binding for the role, fetch the Template, render it
//! with the merged metadata, then apply the role's post-processor.

mod grub;
mod home;
mod ignition;
mod ipxe;
mod metadata;
mod template;

pub(crate) use grub::grub;
pub(crate) use home::home;
pub(crate) use ignition::ignition;
pub(crate) use ipxe::{ipxe, ipxe_inspect};
pub(crate) use metadata::metadata;
pub(crate) use template::template;

use crate::context::RequestContext;
use crate::error::HttpError;
use crate::render::render;
use crate::AppState;

/// A rendered role body, tagged with the id of the Template that produced
/// it so post-processors and error logs can name it.
pub(crate) struct Rendered {
    pub(crate) template: String,
    pub(crate) body: String,
}

pub(crate) async fn render_role(
    state: &AppState,
    ctx: &RequestContext,
    role: &str,
) -> Result<Rendered, HttpError> {
    let resolved = ctx.resolve()?;
    let template_id =
        resolved
            .profile
            .template
            .get(role)
            .ok_or_else(|| HttpError::NoTemplateBinding {
                role: role.to_string(),
                profile: resolved.profile.id.clone(),
            })?;
    let template = state
        .core
        .template_get(template_id)
        .await
        .map_err(|err| HttpError::from_template_lookup(template_id, err))?;
    let contents = std::str::from_utf8(&template.contents)
        .map_err(|_| HttpError::TemplateNotUtf8(template.id.clone()))?;
    let body = render(&template.id, contents, &resolved.metadata).map_err(HttpError::Render)?;
    Ok(Rendered {
        template: template.id,
        body,
    })
}
