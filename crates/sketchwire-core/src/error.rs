//! Shared error type across sketchwire crates.

use thiserror::Error;

/// Stable error codes (reported in logs, metrics labels and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Envelope markup could not be tokenized or is not well-formed.
    MalformedEnvelope,
    /// A text-bearing element closed without text.
    MissingRequiredText,
    /// A field's text could not be decoded under its scheme.
    DecodeFailure,
    /// Nothing to encode.
    EmptyPayload,
    /// Envelope larger than the configured limit.
    PayloadTooLarge,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Outbound sink or inbound source failed.
    Transport,
}

impl ErrorCode {
    /// String representation used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedEnvelope => "MALFORMED_ENVELOPE",
            ErrorCode::MissingRequiredText => "MISSING_REQUIRED_TEXT",
            ErrorCode::DecodeFailure => "DECODE_FAILURE",
            ErrorCode::EmptyPayload => "EMPTY_PAYLOAD",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Transport => "TRANSPORT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SketchError>;

/// Why an envelope was rejected as malformed.
#[derive(Debug, Error)]
pub enum MalformedCause {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("envelope is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("nesting deeper than {0} elements")]
    TooDeep(usize),
    #[error("no <actions> element in envelope")]
    MissingWrapper,
    #[error("invalid {attr} value on <{element}>: {value:?}")]
    InvalidAttribute {
        element: &'static str,
        attr: &'static str,
        value: String,
    },
}

/// Unified error type used by core and peer.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] MalformedCause),
    #[error("<{0}> requires text content")]
    MissingRequiredText(&'static str),
    #[error("cannot decode {encoding} field: {source}")]
    DecodeFailure {
        encoding: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("empty payload: {0}")]
    EmptyPayload(&'static str),
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u32),
    #[error("transport: {0}")]
    Transport(String),
}

impl SketchError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SketchError::MalformedEnvelope(_) => ErrorCode::MalformedEnvelope,
            SketchError::MissingRequiredText(_) => ErrorCode::MissingRequiredText,
            SketchError::DecodeFailure { .. } => ErrorCode::DecodeFailure,
            SketchError::EmptyPayload(_) => ErrorCode::EmptyPayload,
            SketchError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            SketchError::BadConfig(_) => ErrorCode::BadConfig,
            SketchError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            SketchError::Transport(_) => ErrorCode::Transport,
        }
    }
}

impl From<MalformedCause> for SketchError {
    fn from(cause: MalformedCause) -> Self {
        SketchError::MalformedEnvelope(cause)
    }
}

impl From<quick_xml::Error> for SketchError {
    fn from(err: quick_xml::Error) -> Self {
        SketchError::MalformedEnvelope(err.into())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SketchError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        SketchError::MalformedEnvelope(err.into())
    }
}

impl From<std::str::Utf8Error> for SketchError {
    fn from(err: std::str::Utf8Error) -> Self {
        SketchError::MalformedEnvelope(err.into())
    }
}
