use std::collections::{HashMap, HashSet};

use axum::extract::Request;

use matchbox_storage::canonicalize_mac;

/// Extracts request labels from the query string.
///
/// Only the first value of each key is considered. The reserved key `mac`
/// (matched case-insensitively) must parse as a MAC address and is stored in
/// canonical form; unparseable values are dropped with a warning.
pub fn labels_from_request(req: &Request) -> HashMap<String, String> {
    labels_from_query(req.uri().query().unwrap_or(""))
}

/// See [`labels_from_request`].
pub fn labels_from_query(query: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let mut seen = HashSet::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let key = key.into_owned();
        // Matchers don't use multi-value keys; later values are dropped.
        if !seen.insert(key.clone()) {
            continue;
        }
        if key.eq_ignore_ascii_case("mac") {
            match canonicalize_mac(&value) {
                Ok(canonical) => {
                    labels.insert(key, canonical);
                }
                Err(err) => {
                    tracing::warn!(mac = %value, %err, "ignoring unparseable MAC address");
                }
            }
        } else {
            labels.insert(key, value.into_owned());
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_wins_for_duplicate_keys() {
        let labels = labels_from_query("uuid=first&uuid=second");
        assert_eq!(labels.get("uuid").unwrap(), "first");
    }

    #[test]
    fn mac_values_are_canonicalized() {
        let labels = labels_from_query("mac=52-54-00-89-D8-10");
        assert_eq!(labels.get("mac").unwrap(), "52:54:00:89:d8:10");
    }

    #[test]
    fn unparseable_mac_is_dropped() {
        let labels = labels_from_query("mac=nope&uuid=a1");
        assert!(!labels.contains_key("mac"));
        assert_eq!(labels.get("uuid").unwrap(), "a1");
    }

    #[test]
    fn unparseable_first_mac_shadows_later_values() {
        // Only the first value of a key is inspected, even when it is bad.
        let labels = labels_from_query("mac=nope&mac=52:54:00:89:d8:10");
        assert!(!labels.contains_key("mac"));
    }

    #[test]
    fn other_keys_pass_through_unchanged() {
        let labels = labels_from_query("UUID=a1&os=installed");
        assert_eq!(labels.get("UUID").unwrap(), "a1");
        assert_eq!(labels.get("os").unwrap(), "installed");
    }

    #[test]
    fn empty_query_yields_no_labels() {
        assert!(labels_from_query("").is_empty());
    }
}
