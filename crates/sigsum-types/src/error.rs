//! Error type shared by the wire codecs in this crate

/// Errors from parsing or assembling Sigsum wire artifacts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected key: got {got:?}, want {want:?}")]
    UnexpectedKey { want: &'static str, got: String },
    #[error("malformed input line: {0:?}")]
    MalformedLine(String),
    #[error("unexpected end of input, want {0:?}")]
    UnexpectedEof(&'static str),
    #[error("trailing input after parse")]
    TrailingInput,
    #[error("invalid {key} value: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("wrong number of values for {key}: got {got}, want {want}")]
    ValueCount {
        want: usize,
        got: usize,
        key: &'static str,
    },
    /// A signed-note line that is syntactically valid but not addressed to
    /// us. Non-fatal: parse loops skip the line and try the next signer.
    #[error("unwanted signature")]
    UnwantedSignature,
    #[error("no matching signature line found")]
    MissingSignature,
    #[error("signing failed: {0}")]
    Signer(#[from] sigsum_crypto::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
