use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ValidationError;

/// A set of machine-matching rules bound to a [`Profile`](super::Profile).
///
/// A Group matches a request when every selector entry is satisfied by the
/// request labels. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub profile: String,
    /// Required label values, keyed by label name. `BTreeMap` keeps the
    /// canonical selector string deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Group {
    /// Returns true if the given labels satisfy every selector requirement.
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.selector
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    /// Normalizes selectors with reserved semantics: `mac` values must parse
    /// as MAC addresses and are stored lower-cased and colon-separated.
    pub fn normalize(&mut self) -> Result<(), ValidationError> {
        for (key, value) in self.selector.iter_mut() {
            if key.eq_ignore_ascii_case("mac") {
                *value = canonicalize_mac(value)
                    .map_err(|_| ValidationError::InvalidMacSelector(value.clone()))?;
            }
        }
        Ok(())
    }

    /// Returns an error unless `id` and `profile` are both non-empty.
    pub fn assert_valid(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::IdRequired);
        }
        if self.profile.is_empty() {
            return Err(ValidationError::ProfileRequired);
        }
        Ok(())
    }

    /// The canonical selector string: keys sorted, joined as `k=v` pairs
    /// with `,`. Used for deterministic ordering and display.
    pub fn selector_string(&self) -> String {
        let pairs: Vec<String> = self
            .selector
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        pairs.join(",")
    }

    /// Total order used to present match candidates: more selector entries
    /// first, then ascending canonical selector string, then ascending id.
    pub fn match_order(a: &Group, b: &Group) -> Ordering {
        b.selector
            .len()
            .cmp(&a.selector.len())
            .then_with(|| a.selector_string().cmp(&b.selector_string()))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Parses a MAC address in colon, hyphen, or dot notation and returns the
/// canonical lower-case colon-separated form.
pub fn canonicalize_mac(raw: &str) -> Result<String, macaddr::ParseError> {
    let addr: macaddr::MacAddr = raw.parse()?;
    Ok(addr.to_string().to_lowercase())
}
