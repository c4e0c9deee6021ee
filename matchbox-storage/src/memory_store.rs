use async_trait::async_trait;
use dashmap::DashMap;

use crate::resources::{Group, Profile, Template};
use crate::store::{Store, StoreError};

/// An ephemeral in-memory [`Store`].
///
/// Useful for tests and throwaway deployments; contents vanish with the
/// process. Safe for concurrent use.
#[derive(Default)]
pub struct MemoryStore {
    groups: DashMap<String, Group>,
    profiles: DashMap<String, Profile>,
    templates: DashMap<String, Template>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn group_put(&self, mut group: Group) -> Result<(), StoreError> {
        group.assert_valid()?;
        group.normalize()?;
        self.groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn group_get(&self, id: &str) -> Result<Group, StoreError> {
        self.groups
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))
    }

    async fn group_delete(&self, id: &str) -> Result<(), StoreError> {
        self.groups.remove(id);
        Ok(())
    }

    async fn group_list(&self) -> Result<Vec<Group>, StoreError> {
        let mut groups: Vec<Group> = self.groups.iter().map(|entry| entry.value().clone()).collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(groups)
    }

    async fn profile_put(&self, profile: Profile) -> Result<(), StoreError> {
        profile.assert_valid()?;
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    async fn profile_get(&self, id: &str) -> Result<Profile, StoreError> {
        self.profiles
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))
    }

    async fn profile_delete(&self, id: &str) -> Result<(), StoreError> {
        self.profiles.remove(id);
        Ok(())
    }

    async fn profile_list(&self) -> Result<Vec<Profile>, StoreError> {
        let mut profiles: Vec<Profile> = self.profiles.iter().map(|entry| entry.value().clone()).collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }

    async fn template_put(&self, template: Template) -> Result<(), StoreError> {
        template.assert_valid()?;
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    async fn template_get(&self, id: &str) -> Result<Template, StoreError> {
        self.templates
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))
    }

    async fn template_delete(&self, id: &str) -> Result<(), StoreError> {
        self.templates.remove(id);
        Ok(())
    }

    async fn template_list(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates: Vec<Template> =
            self.templates.iter().map(|entry| entry.value().clone()).collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(templates)
    }
}
