use std::{error, result};

/// Errors raised while building requests or transforming responses.
///
/// Every validation failure is detected before the request reaches the
/// network; transport failures are carried through unmodified inside
/// [`Error::Transport`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request cannot be executed as specified (wrong index, missing
    /// key attribute, incompatible conditional, unknown index reference).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Human-readable description naming the offending attribute,
        /// table or index.
        message: String,
    },

    /// Two expression fragments bind the same placeholder to different
    /// payloads.
    #[error("conflicting expression attribute `{placeholder}`")]
    ConflictingExpression {
        /// The placeholder that was bound twice.
        placeholder: String,
    },

    /// An extension hook failed. This indicates a bug in the supplied
    /// extension rather than a malformed request.
    #[error("extension hook failed")]
    Extension {
        /// The error returned by the hook.
        #[source]
        source: Box<dyn error::Error + Send + Sync>,
    },

    /// An item or attribute value could not be serialized or deserialized.
    #[error(transparent)]
    Conversion(#[from] serde_dynamo::Error),

    /// The underlying service call failed. The SDK error is carried
    /// unmodified; this crate performs no retries or reinterpretation.
    #[error("transport error")]
    Transport {
        /// The SDK error as returned by the client.
        #[source]
        source: Box<dyn error::Error + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn extension(source: Box<dyn error::Error + Send + Sync>) -> Self {
        Self::Extension { source }
    }

    pub(crate) fn transport(source: impl error::Error + Send + Sync + 'static) -> Self {
        Self::Transport {
            source: Box::new(source),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = result::Result<T, E>;
