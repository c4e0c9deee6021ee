//! The three resource kinds served to booting machines.

mod group;
mod profile;
mod template;

pub use group::{canonicalize_mac, Group};
pub use profile::Profile;
pub use template::Template;

/// Validation failures raised when a resource is written or normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The resource has an empty `id`.
    IdRequired,
    /// The Group has an empty `profile` reference.
    ProfileRequired,
    /// A `mac` selector value does not parse as a MAC address.
    InvalidMacSelector(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::IdRequired => write!(f, "Id is required"),
            ValidationError::ProfileRequired => write!(f, "Profile Id is required"),
            ValidationError::InvalidMacSelector(value) => {
                write!(f, "invalid MAC address selector: {value}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Serialize `Vec<u8>` fields as base64 strings in JSON.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
