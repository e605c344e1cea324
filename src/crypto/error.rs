use thiserror::Error;

/// Startup failure while resolving the process-wide encryption key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{var} is required and must be set before starting the app.")]
    Missing { var: String },

    #[error("{var} must be a 32-byte key encoded as base64 or 64-char hex.")]
    Malformed { var: String },
}

/// Failure while sealing or opening an envelope.
///
/// Format and integrity failures are both fatal for the stored value, but are
/// kept apart so diagnostics can tell a truncated record from a forged one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("invalid encrypted payload format: {0}")]
    Format(&'static str),

    #[error("invalid encrypted payload components: {0}")]
    Components(&'static str),

    #[error("unsupported envelope version '{0}'")]
    UnknownVersion(String),

    #[error("encrypted payload failed authentication")]
    Integrity,

    #[error("refusing to encrypt an empty value")]
    EmptyPlaintext,

    #[error("failed to encrypt payload")]
    Seal,
}

impl EnvelopeError {
    /// True when the tag did not verify against the nonce and ciphertext.
    pub fn is_integrity(&self) -> bool {
        matches!(self, EnvelopeError::Integrity)
    }

    /// True for malformed envelopes: field count, version, encoding or lengths.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            EnvelopeError::Format(_)
                | EnvelopeError::Components(_)
                | EnvelopeError::UnknownVersion(_)
        )
    }
}
