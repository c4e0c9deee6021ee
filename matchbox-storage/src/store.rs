use async_trait::async_trait;

use crate::resources::{Group, Profile, Template, ValidationError};

/// Errors surfaced by [`Store`] implementations.
#[derive(Debug)]
pub enum StoreError {
    GroupNotFound(String),
    ProfileNotFound(String),
    TemplateNotFound(String),
    /// The resource failed validation or normalization on write.
    Invalid(ValidationError),
    /// A stored value could not be serialized or parsed.
    Serialization(serde_json::Error),
    Io(std::io::Error),
    /// A backend-specific failure (e.g. an etcd request error).
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::GroupNotFound(id) => write!(f, "No Group found: {id}"),
            StoreError::ProfileNotFound(id) => write!(f, "No Profile found: {id}"),
            StoreError::TemplateNotFound(id) => write!(f, "No Template found: {id}"),
            StoreError::Invalid(err) => write!(f, "invalid resource: {err}"),
            StoreError::Serialization(err) => write!(f, "serialization error: {err}"),
            StoreError::Io(err) => write!(f, "I/O error: {err}"),
            StoreError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Invalid(err) => Some(err),
            StoreError::Serialization(err) => Some(err),
            StoreError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl StoreError {
    /// True for the three typed not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::GroupNotFound(_)
                | StoreError::ProfileNotFound(_)
                | StoreError::TemplateNotFound(_)
        )
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Invalid(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// Durable storage of machine Groups, Profiles, and Templates.
///
/// Puts upsert by id, validate, and are atomic per entity: a concurrent
/// reader observes either the old or the new version, never a partial one.
/// Deletes are idempotent. Lists skip individually corrupt entries instead
/// of failing the whole call, and may observe an inconsistent snapshot
/// across entities.
#[async_trait]
pub trait Store: Send + Sync {
    /// Creates or updates a Group.
    async fn group_put(&self, group: Group) -> Result<(), StoreError>;
    /// Returns a machine Group by id.
    async fn group_get(&self, id: &str) -> Result<Group, StoreError>;
    /// Deletes a machine Group by id.
    async fn group_delete(&self, id: &str) -> Result<(), StoreError>;
    /// Lists all machine Groups.
    async fn group_list(&self) -> Result<Vec<Group>, StoreError>;

    /// Creates or updates a Profile.
    async fn profile_put(&self, profile: Profile) -> Result<(), StoreError>;
    /// Returns a Profile by id.
    async fn profile_get(&self, id: &str) -> Result<Profile, StoreError>;
    /// Deletes a Profile by id.
    async fn profile_delete(&self, id: &str) -> Result<(), StoreError>;
    /// Lists all Profiles.
    async fn profile_list(&self) -> Result<Vec<Profile>, StoreError>;

    /// Creates or updates a Template.
    async fn template_put(&self, template: Template) -> Result<(), StoreError>;
    /// Returns a Template by id.
    async fn template_get(&self, id: &str) -> Result<Template, StoreError>;
    /// Deletes a Template by id.
    async fn template_delete(&self, id: &str) -> Result<(), StoreError>;
    /// Lists all Templates.
    async fn template_list(&self) -> Result<Vec<Template>, StoreError>;
}
