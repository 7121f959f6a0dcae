//! Error types.
//!
//! Internally we use `anyhow` (`Res<T>`) and attach context as errors bubble up. At the public
//! boundary (commands, `App`, `Config`) errors are classified with an `ErrorType` so that callers
//! can tell an authentication failure from a sync failure from bad input.

use std::fmt::{Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies a public error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The identity grant failed, was denied, or no valid credential exists.
    Auth,
    /// Locating, uploading or downloading the remote snapshot failed.
    Sync,
    /// The home directory or configuration file is missing or invalid.
    Config,
    /// Reading or writing the local record store failed.
    Storage,
    /// The request itself was invalid, e.g. an unknown id or an unparseable amount.
    Request,
    /// The MCP service failed.
    Service,
    /// Something unexpected.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type.
#[derive(Debug)]
pub struct Error {
    error_type: ErrorType,
    source: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, source: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            source: source.into(),
        }
    }

    /// What kind of error this is.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Converts an internal result into a public one.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[test]
fn test_error_display_includes_type_and_context() {
    use anyhow::Context;
    let res: Res<()> = Err(anyhow::anyhow!("connection refused")).context("Unable to list files");
    let e = res.pub_result(ErrorType::Sync).unwrap_err();
    assert_eq!(e.error_type(), ErrorType::Sync);
    let message = e.to_string();
    assert!(message.starts_with("sync error: "));
    assert!(message.contains("Unable to list files"));
    assert!(message.contains("connection refused"));
}
