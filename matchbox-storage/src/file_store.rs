use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::resources::{Group, Profile, Template};
use crate::store::{Store, StoreError};

const GROUPS_DIR: &str = "groups";
const PROFILES_DIR: &str = "profiles";
const TEMPLATES_DIR: &str = "templates";

/// Configures a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Root of the storage tree: `<root>/{groups,profiles,templates}/<id>.json`.
    pub root: PathBuf,
}

/// A [`Store`] backed by a directory tree of JSON files.
///
/// Writes replace whole files via a temp-file rename in the same directory,
/// so readers never observe a torn entity.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(config: FileStoreConfig) -> Self {
        FileStore { root: config.root }
    }

    fn entity_path(&self, dir: &str, id: &str) -> PathBuf {
        self.root.join(dir).join(format!("{id}.json"))
    }

    async fn write_entity(&self, dir: &str, id: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let parent = self.root.join(dir);
        fs::create_dir_all(&parent).await?;
        let target = parent.join(format!("{id}.json"));
        let staging = parent.join(format!(".{id}.json.tmp"));
        fs::write(&staging, data).await?;
        fs::rename(&staging, &target).await?;
        Ok(())
    }

    async fn read_entity(&self, dir: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.entity_path(dir, id)).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_entity(&self, dir: &str, id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.entity_path(dir, id)).await {
            Ok(()) => Ok(()),
            // Deleting an absent entity is a success.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists the ids under `dir` by stripping the `.json` suffix from each
    /// directory entry. A missing directory is an empty listing.
    async fn list_ids(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = match fs::read_dir(self.root.join(dir)).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl Store for FileStore {
    async fn group_put(&self, mut group: Group) -> Result<(), StoreError> {
        group.assert_valid()?;
        group.normalize()?;
        let data = serde_json::to_vec_pretty(&group)?;
        self.write_entity(GROUPS_DIR, &group.id, data).await
    }

    async fn group_get(&self, id: &str) -> Result<Group, StoreError> {
        let data = self
            .read_entity(GROUPS_DIR, id)
            .await?
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))?;
        let mut group: Group = serde_json::from_slice(&data)?;
        group.normalize()?;
        Ok(group)
    }

    async fn group_delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_entity(GROUPS_DIR, id).await
    }

    async fn group_list(&self) -> Result<Vec<Group>, StoreError> {
        let mut groups = Vec::new();
        for id in self.list_ids(GROUPS_DIR).await? {
            match self.group_get(&id).await {
                Ok(group) => groups.push(group),
                // Tolerates entries deleted between listing and reading.
                Err(err) => tracing::warn!(group = %id, %err, "skipping unreadable Group"),
            }
        }
        Ok(groups)
    }

    async fn profile_put(&self, profile: Profile) -> Result<(), StoreError> {
        profile.assert_valid()?;
        let data = serde_json::to_vec_pretty(&profile)?;
        self.write_entity(PROFILES_DIR, &profile.id, data).await
    }

    async fn profile_get(&self, id: &str) -> Result<Profile, StoreError> {
        let data = self
            .read_entity(PROFILES_DIR, id)
            .await?
            .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))?;
        let profile: Profile = serde_json::from_slice(&data)?;
        profile.assert_valid()?;
        Ok(profile)
    }

    async fn profile_delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_entity(PROFILES_DIR, id).await
    }

    async fn profile_list(&self) -> Result<Vec<Profile>, StoreError> {
        let mut profiles = Vec::new();
        for id in self.list_ids(PROFILES_DIR).await? {
            match self.profile_get(&id).await {
                Ok(profile) => profiles.push(profile),
                Err(err) => tracing::warn!(profile = %id, %err, "skipping unreadable Profile"),
            }
        }
        Ok(profiles)
    }

    async fn template_put(&self, template: Template) -> Result<(), StoreError> {
        template.assert_valid()?;
        let data = serde_json::to_vec_pretty(&template)?;
        self.write_entity(TEMPLATES_DIR, &template.id, data).await
    }

    async fn template_get(&self, id: &str) -> Result<Template, StoreError> {
        let data = self
            .read_entity(TEMPLATES_DIR, id)
            .await?
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?;
        let template: Template = serde_json::from_slice(&data)?;
        template.assert_valid()?;
        Ok(template)
    }

    async fn template_delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_entity(TEMPLATES_DIR, id).await
    }

    async fn template_list(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates = Vec::new();
        for id in self.list_ids(TEMPLATES_DIR).await? {
            match self.template_get(&id).await {
                Ok(template) => templates.push(template),
                Err(err) => tracing::warn!(template = %id, %err, "skipping unreadable Template"),
            }
        }
        Ok(templates)
    }
}
