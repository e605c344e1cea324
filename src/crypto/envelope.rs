//! AES-256-GCM envelope for secrets stored at rest.
//!
//! Textual form: `v1:<base64 nonce>:<base64 tag>:<base64 ciphertext>`.
//! Every call to [`EnvelopeCodec::encrypt`] draws a fresh 96-bit nonce.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use std::fmt;

use super::error::EnvelopeError;
use super::key::EncryptionKey;

pub const ENVELOPE_VERSION: &str = "v1";
pub const DELIMITER: char = ':';
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Decoded envelope components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Splits and decodes the textual form without touching the cipher.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let parts: Vec<&str> = text.split(DELIMITER).collect();
        if parts.len() != 4 {
            return Err(EnvelopeError::Format("expected four delimited fields"));
        }
        if parts.iter().any(|part| part.is_empty()) {
            return Err(EnvelopeError::Format("empty field"));
        }

        if parts[0] != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnknownVersion(parts[0].to_string()));
        }

        let nonce = decode_component(parts[1], "nonce is not base64")?;
        let tag = decode_component(parts[2], "tag is not base64")?;
        let ciphertext = decode_component(parts[3], "ciphertext is not base64")?;

        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| EnvelopeError::Components("nonce must be 12 bytes"))?;
        let tag: [u8; TAG_LEN] = tag
            .try_into()
            .map_err(|_| EnvelopeError::Components("tag must be 16 bytes"))?;

        Ok(Self {
            nonce,
            tag,
            ciphertext,
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ENVELOPE_VERSION}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            STANDARD.encode(self.nonce),
            STANDARD.encode(self.tag),
            STANDARD.encode(&self.ciphertext),
        )
    }
}

fn decode_component(part: &str, what: &'static str) -> Result<Vec<u8>, EnvelopeError> {
    STANDARD
        .decode(part)
        .map_err(|_| EnvelopeError::Components(what))
}

/// Seals and opens envelopes with the process key.
///
/// Holds only the expanded cipher state, so one codec can be shared across
/// concurrent requests.
#[derive(Clone)]
pub struct EnvelopeCodec {
    cipher: Aes256Gcm,
}

impl EnvelopeCodec {
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, EnvelopeError> {
        if plaintext.is_empty() {
            return Err(EnvelopeError::EmptyPlaintext);
        }

        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let mut sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| EnvelopeError::Seal)?;

        // aes-gcm appends the tag to the ciphertext.
        let tag_start = sealed.len() - TAG_LEN;
        let tag: [u8; TAG_LEN] = sealed[tag_start..]
            .try_into()
            .map_err(|_| EnvelopeError::Seal)?;
        sealed.truncate(tag_start);

        Ok(Envelope {
            nonce,
            tag,
            ciphertext: sealed,
        }
        .to_string())
    }

    pub fn decrypt(&self, text: &str) -> Result<String, EnvelopeError> {
        let envelope = Envelope::parse(text)?;

        let mut sealed = envelope.ciphertext;
        sealed.extend_from_slice(&envelope.tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&envelope.nonce), sealed.as_slice())
            .map_err(|_| EnvelopeError::Integrity)?;

        String::from_utf8(plaintext).map_err(|_| EnvelopeError::Format("plaintext is not UTF-8"))
    }
}

impl fmt::Debug for EnvelopeCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCodec").finish_non_exhaustive()
    }
}
