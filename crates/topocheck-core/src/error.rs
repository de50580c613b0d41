use crate::{ThisError, config::ConfigError, diagnostics::VerifyError, model::SnapshotError};

///
/// Error
///
/// Top-level error for callers that go from text to verdict in one step
/// (template TOML, snapshot JSON, verification).
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl Error {
    /// Returns the verification failure, if this error is one.
    #[must_use]
    pub const fn as_verify(&self) -> Option<&VerifyError> {
        match self {
            Self::Verify(err) => Some(err),
            _ => None,
        }
    }
}
