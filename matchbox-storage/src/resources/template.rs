use serde::{Deserialize, Serialize};

use super::{base64_bytes, ValidationError};

/// A stored template body, rendered per request with merged metadata.
///
/// `contents` holds the raw template source and serializes as base64 in the
/// on-disk JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<u8>,
}

impl Template {
    /// Returns an error unless `id` is non-empty.
    pub fn assert_valid(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::IdRequired);
        }
        Ok(())
    }
}
