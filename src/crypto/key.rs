//! Process-wide symmetric key used to seal stored credentials.
//!
//! The key is read once at startup and passed by reference into
//! [`EnvelopeCodec`](super::EnvelopeCodec). Two encodings are accepted:
//!
//! - standard base64 that decodes to exactly 32 bytes and re-encodes to the
//!   same text (whitespace ignored),
//! - 64 hexadecimal characters, either case.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use super::error::KeyError;

pub const APP_ENCRYPTION_KEY_ENV: &str = "APP_ENCRYPTION_KEY";
pub const KEY_LEN: usize = 32;

pub struct EncryptionKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    /// Reads and validates `APP_ENCRYPTION_KEY`.
    pub fn from_env() -> Result<Self, KeyError> {
        Self::from_env_var(APP_ENCRYPTION_KEY_ENV)
    }

    pub fn from_env_var(var: &str) -> Result<Self, KeyError> {
        let raw = std::env::var(var).ok();
        Self::resolve(var, raw.as_deref())
    }

    /// Parses a configured key value, reporting errors against `APP_ENCRYPTION_KEY`.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        Self::resolve(APP_ENCRYPTION_KEY_ENV, Some(raw))
    }

    fn resolve(var: &str, raw: Option<&str>) -> Result<Self, KeyError> {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Err(KeyError::Missing {
                var: var.to_string(),
            });
        }

        if let Some(bytes) = decode_base64_key(trimmed) {
            return Ok(Self::from_bytes(bytes));
        }

        if let Some(bytes) = decode_hex_key(trimmed) {
            return Ok(Self::from_bytes(bytes));
        }

        Err(KeyError::Malformed {
            var: var.to_string(),
        })
    }

    /// Draws a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// Base64 form suitable for `APP_ENCRYPTION_KEY`.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes.as_slice())
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

fn decode_base64_key(value: &str) -> Option<[u8; KEY_LEN]> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = STANDARD.decode(compact.as_bytes()).ok()?;
    // Reject anything base64 cannot reproduce byte-for-byte.
    if STANDARD.encode(&decoded) != compact {
        return None;
    }
    decoded.try_into().ok()
}

fn decode_hex_key(value: &str) -> Option<[u8; KEY_LEN]> {
    if value.len() != KEY_LEN * 2 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let decoded = hex::decode(value).ok()?;
    decoded.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base64_key() {
        let encoded = STANDARD.encode([7u8; KEY_LEN]);
        let key = EncryptionKey::parse(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_LEN]);
    }

    #[test]
    fn test_parse_base64_key_with_surrounding_whitespace() {
        let encoded = format!("  {}\n", STANDARD.encode([9u8; KEY_LEN]));
        let key = EncryptionKey::parse(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[9u8; KEY_LEN]);
    }

    #[test]
    fn test_parse_hex_key_either_case() {
        let lower = "ab".repeat(KEY_LEN);
        let upper = lower.to_uppercase();
        assert_eq!(
            EncryptionKey::parse(&lower).unwrap().as_bytes(),
            &[0xab; KEY_LEN]
        );
        assert_eq!(
            EncryptionKey::parse(&upper).unwrap().as_bytes(),
            &[0xab; KEY_LEN]
        );
    }

    #[test]
    fn test_rejects_wrong_length_base64() {
        for len in [31usize, 33] {
            let encoded = STANDARD.encode(vec![1u8; len]);
            let err = EncryptionKey::parse(&encoded).unwrap_err();
            assert!(matches!(err, KeyError::Malformed { .. }), "len {len}");
        }
    }

    #[test]
    fn test_rejects_wrong_length_hex() {
        for len in [31usize, 33] {
            let encoded = "0f".repeat(len);
            let err = EncryptionKey::parse(&encoded).unwrap_err();
            assert!(matches!(err, KeyError::Malformed { .. }), "len {len}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        let err = EncryptionKey::parse("definitely not a key!!").unwrap_err();
        assert_eq!(
            err,
            KeyError::Malformed {
                var: APP_ENCRYPTION_KEY_ENV.to_string()
            }
        );
        // 64 characters, but not hex and not canonical base64
        assert!(EncryptionKey::parse(&"zz".repeat(KEY_LEN)).is_err());
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(matches!(
            EncryptionKey::parse(""),
            Err(KeyError::Missing { .. })
        ));
        assert!(matches!(
            EncryptionKey::parse("   \t"),
            Err(KeyError::Missing { .. })
        ));
    }

    #[test]
    fn test_missing_env_var_is_reported_by_name() {
        let err = EncryptionKey::from_env_var("W3W_ORDER_SYNC_TEST_UNSET_KEY").unwrap_err();
        assert_eq!(
            err.to_string(),
            "W3W_ORDER_SYNC_TEST_UNSET_KEY is required and must be set before starting the app."
        );
    }

    #[test]
    fn test_generated_key_round_trips_through_base64() {
        let key = EncryptionKey::generate();
        let parsed = EncryptionKey::parse(&key.to_base64()).unwrap();
        assert_eq!(key.as_bytes(), parsed.as_bytes());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = EncryptionKey::from_bytes([0x42; KEY_LEN]);
        let shown = format!("{key:?}");
        assert!(!shown.contains("42"));
        assert!(shown.contains("redacted"));
    }
}
