/// Convenience result type used across the public API.
pub type MixscapeResult<T> = Result<T, MixscapeError>;

/// Top-level error type for mix loading, asset handling and layer lifecycle.
///
/// The animation core itself recovers from asset and lifecycle failures locally; these
/// variants surface only from configuration, decoding and explicit API misuse.
#[derive(thiserror::Error, Debug)]
pub enum MixscapeError {
    /// Input data failed structural or semantic validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An asset could not be decoded or is not drawable.
    #[error("asset error: {0}")]
    Asset(String),

    /// A layer or element operation was issued in an invalid lifecycle state.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MixscapeError {
    /// Build a [`MixscapeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MixscapeError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`MixscapeError::Lifecycle`] value.
    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }

    /// Build a [`MixscapeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for MixscapeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
