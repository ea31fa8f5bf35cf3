/// Convenience result type used across Montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// Invalid caller-provided data (bad spans, bad options, malformed values).
    #[error("validation error: {0}")]
    Validation(String),

    /// A frame, offset or index outside its permitted range. The model is left unchanged.
    #[error("range error: {0}")]
    Range(String),

    /// Programming or startup configuration error (duplicate parameter keys, unknown factory
    /// keys). Not retried; initialization should abort.
    #[error("configuration error: {0}")]
    Config(String),

    /// The model no longer satisfies its own invariants. Callers should stop trusting it.
    #[error("corrupted state: {0}")]
    CorruptedState(String),

    /// A clip or effect failed while rendering a track.
    #[error("render error on track {track}: {message}")]
    Render {
        /// Index of the track whose render step failed.
        track: usize,
        /// Failure description.
        message: String,
    },

    /// Errors when writing or reading structured dictionaries.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MontageError::Range`] value.
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Build a [`MontageError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`MontageError::CorruptedState`] value.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::CorruptedState(msg.into())
    }

    /// Build a [`MontageError::Render`] value for `track`.
    pub fn render(track: usize, msg: impl Into<String>) -> Self {
        Self::Render {
            track,
            message: msg.into(),
        }
    }

    /// Build a [`MontageError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that leave the model untouched and can be retried with
    /// different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Range(_) | Self::Render { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
