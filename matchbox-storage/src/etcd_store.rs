use async_trait::async_trait;
use etcd_client::{Client, GetOptions};

use crate::resources::{Group, Profile, Template};
use crate::store::{Store, StoreError};

/// All keys live under this namespace, suffixed with the configured prefix.
const NAMESPACE: &str = "coreos.matchbox.v1";

/// Configures an [`EtcdStore`].
#[derive(Debug, Clone)]
pub struct EtcdStoreConfig {
    pub endpoints: Vec<String>,
    /// Second path component of the key namespace, separating deployments
    /// that share a cluster.
    pub prefix: String,
}

/// A [`Store`] backed by an etcd cluster.
///
/// Entities are JSON values under
/// `coreos.matchbox.v1/<prefix>/{groups,profiles,templates}/<id>`. Each put
/// is a single-key write, so per-entity atomicity comes from etcd itself.
pub struct EtcdStore {
    client: Client,
    namespace: String,
}

impl From<etcd_client::Error> for StoreError {
    fn from(err: etcd_client::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl EtcdStore {
    pub async fn connect(config: EtcdStoreConfig) -> Result<Self, StoreError> {
        let client = Client::connect(&config.endpoints, None).await?;
        Ok(EtcdStore {
            client,
            namespace: format!("{NAMESPACE}/{}", config.prefix),
        })
    }

    fn key(&self, kind: &str, id: &str) -> String {
        entity_key(&self.namespace, kind, id)
    }

    fn kind_prefix(&self, kind: &str) -> String {
        format!("{}/{kind}/", self.namespace)
    }

    async fn put_value(&self, key: String, data: Vec<u8>) -> Result<(), StoreError> {
        let mut client = self.client.clone();
        client.put(key, data, None).await?;
        Ok(())
    }

    async fn get_value(&self, key: String) -> Result<Option<Vec<u8>>, StoreError> {
        let mut client = self.client.clone();
        let resp = client.get(key, None).await?;
        Ok(resp.kvs().first().map(|kv| kv.value().to_vec()))
    }

    async fn delete_value(&self, key: String) -> Result<(), StoreError> {
        let mut client = self.client.clone();
        client.delete(key, None).await?;
        Ok(())
    }

    /// Prefix-scans a kind and parses each value, skipping corrupt entries.
    async fn scan<T, F>(&self, kind: &str, parse: F) -> Result<Vec<T>, StoreError>
    where
        F: Fn(&[u8]) -> Result<T, StoreError>,
    {
        let mut client = self.client.clone();
        let resp = client
            .get(self.kind_prefix(kind), Some(GetOptions::new().with_prefix()))
            .await?;
        let mut entities = Vec::with_capacity(resp.kvs().len());
        for kv in resp.kvs() {
            match parse(kv.value()) {
                Ok(entity) => entities.push(entity),
                Err(err) => {
                    let key = String::from_utf8_lossy(kv.key()).into_owned();
                    tracing::warn!(%key, %err, "skipping unreadable entry");
                }
            }
        }
        Ok(entities)
    }
}

#[async_trait]
impl Store for EtcdStore {
    async fn group_put(&self, mut group: Group) -> Result<(), StoreError> {
        group.assert_valid()?;
        group.normalize()?;
        let data = serde_json::to_vec_pretty(&group)?;
        self.put_value(self.key("groups", &group.id), data).await
    }

    async fn group_get(&self, id: &str) -> Result<Group, StoreError> {
        let data = self
            .get_value(self.key("groups", id))
            .await?
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))?;
        let mut group: Group = serde_json::from_slice(&data)?;
        group.normalize()?;
        Ok(group)
    }

    async fn group_delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_value(self.key("groups", id)).await
    }

    async fn group_list(&self) -> Result<Vec<Group>, StoreError> {
        self.scan("groups", |data| {
            let mut group: Group = serde_json::from_slice(data)?;
            group.normalize()?;
            Ok(group)
        })
        .await
    }

    async fn profile_put(&self, profile: Profile) -> Result<(), StoreError> {
        profile.assert_valid()?;
        let data = serde_json::to_vec_pretty(&profile)?;
        self.put_value(self.key("profiles", &profile.id), data).await
    }

    async fn profile_get(&self, id: &str) -> Result<Profile, StoreError> {
        let data = self
            .get_value(self.key("profiles", id))
            .await?
            .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))?;
        let profile: Profile = serde_json::from_slice(&data)?;
        profile.assert_valid()?;
        Ok(profile)
    }

    async fn profile_delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_value(self.key("profiles", id)).await
    }

    async fn profile_list(&self) -> Result<Vec<Profile>, StoreError> {
        self.scan("profiles", |data| {
            let profile: Profile = serde_json::from_slice(data)?;
            profile.assert_valid()?;
            Ok(profile)
        })
        .await
    }

    async fn template_put(&self, template: Template) -> Result<(), StoreError> {
        template.assert_valid()?;
        let data = serde_json::to_vec_pretty(&template)?;
        self.put_value(self.key("templates", &template.id), data)
            .await
    }

    async fn template_get(&self, id: &str) -> Result<Template, StoreError> {
        let data = self
            .get_value(self.key("templates", id))
            .await?
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?;
        let template: Template = serde_json::from_slice(&data)?;
        template.assert_valid()?;
        Ok(template)
    }

    async fn template_delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_value(self.key("templates", id)).await
    }

    async fn template_list(&self) -> Result<Vec<Template>, StoreError> {
        self.scan("templates", |data| {
            let template: Template = serde_json::from_slice(data)?;
            template.assert_valid()?;
            Ok(template)
        })
        .await
    }
}

fn entity_key(namespace: &str, kind: &str, id: &str) -> String {
    format!("{namespace}/{kind}/{id}")
}
