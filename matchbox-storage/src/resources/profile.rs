use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ValidationError;

/// A named bundle of template role bindings and metadata.
///
/// `template` maps role names (`ipxe`, `grub`, `ignition`, or user-defined)
/// to Template ids. Bindings may dangle; they fail when the role is rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Role name to Template id. Stored profiles written by older releases
    /// used the key `selector`, accepted here on read.
    #[serde(default, alias = "selector", skip_serializing_if = "BTreeMap::is_empty")]
    pub template: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Profile {
    /// Returns an error unless `id` is non-empty.
    pub fn assert_valid(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::IdRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_legacy_selector_key_on_read() {
        let parsed: Profile =
            serde_json::from_str(r#"{"id":"p1","selector":{"ipxe":"t1"}}"#).unwrap();
        assert_eq!(parsed.template.get("ipxe").unwrap(), "t1");
    }

    #[test]
    fn serializes_bindings_under_template() {
        let profile = Profile {
            id: "p1".to_string(),
            template: [("ipxe".to_string(), "t1".to_string())].into_iter().collect(),
            ..Profile::default()
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains(r#""template""#));
        let round: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(round, profile);
    }

    #[test]
    fn assert_valid_requires_id() {
        assert_eq!(
            Profile::default().assert_valid(),
            Err(ValidationError::IdRequired)
        );
    }
}
