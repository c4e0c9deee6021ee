use serde::Deserialize;

/// The parts of an Ignition config the endpoint validates: a JSON object
/// carrying an `ignition.version` string. Everything else passes through
/// untouched.
#[derive(Debug, Deserialize)]
struct IgnitionConfig {
    ignition: IgnitionHeader,
}

#[derive(Debug, Deserialize)]
struct IgnitionHeader {
    version: String,
}

/// A rendered body that is not a valid Ignition config.
#[derive(Debug)]
pub enum IgnitionError {
    Parse(serde_json::Error),
    MissingVersion,
}

impl std::fmt::Display for IgnitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnitionError::Parse(err) => write!(f, "{err}"),
            IgnitionError::MissingVersion => write!(f, "ignition.version is empty"),
        }
    }
}

impl std::error::Error for IgnitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IgnitionError::Parse(err) => Some(err),
            IgnitionError::MissingVersion => None,
        }
    }
}

/// Validates rendered bytes as an Ignition config.
pub fn validate(data: &[u8]) -> Result<(), IgnitionError> {
    let config: IgnitionConfig = serde_json::from_slice(data).map_err(IgnitionError::Parse)?;
    if config.ignition.version.is_empty() {
        return Err(IgnitionError::MissingVersion);
    }
    Ok(())
}
