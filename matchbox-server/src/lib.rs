//! The core matchbox service.
//!
//! [`Server`] owns a shared [`Store`] handle and implements the operations
//! every surface (HTTP, RPC) goes through: selecting the Group that best
//! matches a set of request labels, resolving it to a Profile, and the CRUD
//! pass-throughs for the three resource kinds. Both the HTTP handlers and
//! any admin surface use the same selection entry points, so match behaviour
//! cannot diverge between them.

use std::collections::HashMap;
use std::sync::Arc;

use matchbox_storage::{assert_default_templates, Group, Profile, Store, StoreError, Template};

/// Errors raised by the core service.
#[derive(Debug)]
pub enum CoreError {
    /// No Group selector is satisfied by the request labels.
    NoMatchingGroup,
    /// A Group matched but its Profile could not be resolved.
    NoMatchingProfile,
    Store(StoreError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::NoMatchingGroup => write!(f, "No matching Group"),
            CoreError::NoMatchingProfile => write!(f, "No matching Profile"),
            CoreError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Store(err)
    }
}

/// The matchbox core: label matching plus resource CRUD over a [`Store`].
#[derive(Clone)]
pub struct Server {
    store: Arc<dyn Store>,
}

impl Server {
    /// Wraps a store and seeds the reserved default templates (best-effort).
    pub async fn new(store: Arc<dyn Store>) -> Self {
        assert_default_templates(store.as_ref()).await;
        Server { store }
    }

    /// Selects the Group whose selector best matches the given labels.
    ///
    /// Candidates are evaluated from most selector entries to fewest, with
    /// the canonical selector string and then the id as tie-breakers, so a
    /// fixed store and label set always select the same Group.
    pub async fn select_group(
        &self,
        labels: &HashMap<String, String>,
    ) -> Result<Group, CoreError> {
        let mut groups = self.store.group_list().await?;
        groups.sort_by(Group::match_order);
        groups
            .into_iter()
            .find(|group| group.matches(labels))
            .ok_or(CoreError::NoMatchingGroup)
    }

    /// Selects the Profile referenced by the best-matching Group.
    pub async fn select_profile(
        &self,
        labels: &HashMap<String, String>,
    ) -> Result<Profile, CoreError> {
        let group = self.select_group(labels).await?;
        self.store
            .profile_get(&group.profile)
            .await
            .map_err(|_| CoreError::NoMatchingProfile)
    }

    pub async fn group_put(&self, group: Group) -> Result<(), CoreError> {
        Ok(self.store.group_put(group).await?)
    }

    pub async fn group_get(&self, id: &str) -> Result<Group, CoreError> {
        Ok(self.store.group_get(id).await?)
    }

    pub async fn group_delete(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.store.group_delete(id).await?)
    }

    pub async fn group_list(&self) -> Result<Vec<Group>, CoreError> {
        Ok(self.store.group_list().await?)
    }

    pub async fn profile_put(&self, profile: Profile) -> Result<(), CoreError> {
        Ok(self.store.profile_put(profile).await?)
    }

    pub async fn profile_get(&self, id: &str) -> Result<Profile, CoreError> {
        Ok(self.store.profile_get(id).await?)
    }

    pub async fn profile_delete(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.store.profile_delete(id).await?)
    }

    pub async fn profile_list(&self) -> Result<Vec<Profile>, CoreError> {
        Ok(self.store.profile_list().await?)
    }

    pub async fn template_put(&self, template: Template) -> Result<(), CoreError> {
        Ok(self.store.template_put(template).await?)
    }

    pub async fn template_get(&self, id: &str) -> Result<Template, CoreError> {
        Ok(self.store.template_get(id).await?)
    }

    pub async fn template_delete(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.store.template_delete(id).await?)
    }

    pub async fn template_list(&self) -> Result<Vec<Template>, CoreError> {
        Ok(self.store.template_list().await?)
    }
}
