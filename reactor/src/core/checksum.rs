//! Integrity tokens for client-held component state.
//!
//! The state a client sends back must carry the token the server minted for
//! it. Tokens are derived as follows:
//!
//! 1. serialize the state as compact JSON (see [`KeyOrder`]),
//! 2. HMAC-SHA256 it with the server secret and hex-encode the digest,
//! 3. derive a name-based (v5, DNS namespace) UUID from the hex string,
//! 4. encode the UUID in base 57, most significant digit first, padded to
//!    22 symbols, and keep the first 8 symbols.
//!
//! The encoding must stay bit-exact: tokens are minted by whatever renders
//! the page and checked here.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use uuid::Uuid;

use crate::core::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Base-57 alphabet: digits and letters minus the easily confused `0 1 I O l`.
const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
/// Symbols needed for any 128-bit value in base 57.
const ENCODED_LEN: usize = 22;
/// Length of the token carried on the wire.
pub const TOKEN_LEN: usize = 8;

/// Object key order used when serializing state for signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrder {
    /// Keys in the order they appear in the document.
    #[default]
    Document,
    /// Keys sorted recursively, so key order never affects the token.
    Sorted,
}

/// Mints and checks state tokens with a fixed secret.
#[derive(Clone)]
pub struct ChecksumValidator {
    secret: String,
    key_order: KeyOrder,
}

impl std::fmt::Debug for ChecksumValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumValidator")
            .field("secret", &"<redacted>")
            .field("key_order", &self.key_order)
            .finish()
    }
}

impl ChecksumValidator {
    pub fn new(secret: impl Into<String>, key_order: KeyOrder) -> Self {
        Self {
            secret: secret.into(),
            key_order,
        }
    }

    pub fn key_order(&self) -> KeyOrder {
        self.key_order
    }

    /// Token for `state`. Refuses to sign with an empty secret.
    pub fn generate(&self, state: &Map<String, Value>) -> Result<String> {
        if self.secret.is_empty() {
            return Err(Error::Secret);
        }
        let canonical = self.canonical_bytes(state)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| Error::Secret)?;
        mac.update(&canonical);
        let digest = hex::encode(mac.finalize().into_bytes());
        Ok(short_token(&digest))
    }

    /// Check `supplied` against the token for `state`.
    ///
    /// A missing or empty token is a validation error; a wrong one is an
    /// integrity error.
    pub fn validate(&self, state: &Map<String, Value>, supplied: Option<&str>) -> Result<()> {
        let supplied = match supplied {
            Some(token) if !token.is_empty() => token,
            _ => return Err(Error::validation("Missing checksum")),
        };
        if self.generate(state)? != supplied {
            return Err(Error::Integrity);
        }
        Ok(())
    }

    /// Compact JSON bytes that get signed.
    pub fn canonical_bytes(&self, state: &Map<String, Value>) -> Result<Vec<u8>> {
        let bytes = match self.key_order {
            KeyOrder::Document => serde_json::to_vec(state),
            KeyOrder::Sorted => serde_json::to_vec(&sorted(&Value::Object(state.clone()))),
        };
        bytes.map_err(Error::Serialize)
    }
}

/// Token for `state` under `secret`, with keys in document order.
pub fn generate_checksum(state: &Map<String, Value>, secret: &str) -> Result<String> {
    ChecksumValidator::new(secret, KeyOrder::Document).generate(state)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), sorted(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Reduce a hex digest to the 8-symbol wire token.
fn short_token(hex_digest: &str) -> String {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_DNS, hex_digest.as_bytes());
    let mut encoded = encode_base57(uuid.as_u128());
    encoded.truncate(TOKEN_LEN);
    encoded
}

fn encode_base57(mut number: u128) -> String {
    let base = ALPHABET.len() as u128;
    let mut digits = Vec::with_capacity(ENCODED_LEN);
    while number > 0 {
        digits.push(ALPHABET[(number % base) as usize]);
        number /= base;
    }
    while digits.len() < ENCODED_LEN {
        digits.push(ALPHABET[0]);
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}
