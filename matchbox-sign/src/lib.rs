//! Signature capability for served configs.
//!
//! A [`Signer`] produces a detached signature over an already-rendered
//! response body. Two forms exist over the same Ed25519 key: the raw 64-byte
//! signature served for `.sig` URLs and a PEM-style armored text form served
//! for `.asc` URLs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ed25519_dalek::{Signer as _, SigningKey};

const ARMOR_HEADER: &str = "-----BEGIN ED25519 SIGNATURE-----";
const ARMOR_FOOTER: &str = "-----END ED25519 SIGNATURE-----";
const ARMOR_WIDTH: usize = 64;

/// Errors from signing or key loading.
#[derive(Debug)]
pub enum SignError {
    /// The key material could not be read or decoded.
    Key(String),
    /// The signing operation itself failed.
    Signature(ed25519_dalek::SignatureError),
}

impl std::fmt::Display for SignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignError::Key(msg) => write!(f, "signing key error: {msg}"),
            SignError::Signature(err) => write!(f, "signature error: {err}"),
        }
    }
}

impl std::error::Error for SignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignError::Signature(err) => Some(err),
            _ => None,
        }
    }
}

/// Produces a detached signature of a message.
pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError>;
}

/// Signs with Ed25519 and emits the raw 64-byte detached signature.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn new(key: SigningKey) -> Self {
        Ed25519Signer { key }
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError> {
        let signature = self
            .key
            .try_sign(message)
            .map_err(SignError::Signature)?;
        Ok(signature.to_bytes().to_vec())
    }
}

/// Signs with Ed25519 and emits a PEM-style armored text signature.
pub struct ArmoredEd25519Signer {
    inner: Ed25519Signer,
}

impl ArmoredEd25519Signer {
    pub fn new(key: SigningKey) -> Self {
        ArmoredEd25519Signer {
            inner: Ed25519Signer::new(key),
        }
    }
}

impl Signer for ArmoredEd25519Signer {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError> {
        let raw = self.inner.sign(message)?;
        Ok(armor(&raw).into_bytes())
    }
}

/// Wraps raw signature bytes in a PEM-style armor block.
fn armor(raw: &[u8]) -> String {
    let encoded = STANDARD.encode(raw);
    let mut out = String::with_capacity(encoded.len() + 80);
    out.push_str(ARMOR_HEADER);
    out.push('\n');
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(ARMOR_WIDTH));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push_str(ARMOR_FOOTER);
    out.push('\n');
    out
}

/// Loads an Ed25519 signing key from a seed file.
///
/// Accepts either exactly 32 raw bytes or a base64-encoded 32-byte seed
/// (surrounding whitespace tolerated).
pub fn load_signing_key(data: &[u8]) -> Result<SigningKey, SignError> {
    let seed: [u8; 32] = if data.len() == 32 {
        data.try_into().expect("length checked")
    } else {
        let text = std::str::from_utf8(data)
            .map_err(|_| SignError::Key("seed is neither 32 raw bytes nor base64 text".into()))?;
        let decoded = STANDARD
            .decode(text.trim().as_bytes())
            .map_err(|err| SignError::Key(format!("base64 seed: {err}")))?;
        decoded
            .as_slice()
            .try_into()
            .map_err(|_| SignError::Key(format!("seed must be 32 bytes, got {}", decoded.len())))?
    };
    Ok(SigningKey::from_bytes(&seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier as _};

    fn test_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    #[test]
    fn detached_signature_verifies() {
        let key = test_key();
        let verifying = key.verifying_key();
        let signer = Ed25519Signer::new(key);

        let raw = signer.sign(b"#!ipxe\nboot\n").unwrap();
        let signature = Signature::from_slice(&raw).unwrap();
        assert!(verifying.verify(b"#!ipxe\nboot\n", &signature).is_ok());
        assert!(verifying.verify(b"tampered", &signature).is_err());
    }

    #[test]
    fn armored_signature_decodes_to_the_detached_form() {
        let key = test_key();
        let detached = Ed25519Signer::new(test_key()).sign(b"body").unwrap();
        let armored = ArmoredEd25519Signer::new(key).sign(b"body").unwrap();

        let text = String::from_utf8(armored).unwrap();
        assert!(text.starts_with(ARMOR_HEADER));
        assert!(text.trim_end().ends_with(ARMOR_FOOTER));
        let encoded: String = text
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        assert_eq!(STANDARD.decode(encoded).unwrap(), detached);
    }

    #[test]
    fn loads_raw_and_base64_seeds() {
        let seed = [9u8; 32];
        let from_raw = load_signing_key(&seed).unwrap();
        let encoded = STANDARD.encode(seed);
        let from_b64 = load_signing_key(format!("{encoded}\n").as_bytes()).unwrap();
        assert_eq!(from_raw.to_bytes(), from_b64.to_bytes());
    }

    #[test]
    fn rejects_short_seeds() {
        let err = load_signing_key(&STANDARD.encode([1u8; 16]).into_bytes()).unwrap_err();
        assert!(matches!(err, SignError::Key(_)));
    }
}
