//! Encryption at rest for per-shop credentials.
//!
//! [`EncryptionKey`] is resolved once from configuration and handed to
//! [`EnvelopeCodec`], which produces and verifies `v1` envelopes.

mod envelope;
mod error;
mod key;

pub use envelope::{DELIMITER, ENVELOPE_VERSION, Envelope, EnvelopeCodec, NONCE_LEN, TAG_LEN};
pub use error::{EnvelopeError, KeyError};
pub use key::{APP_ENCRYPTION_KEY_ENV, EncryptionKey, KEY_LEN};
