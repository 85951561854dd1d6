use crate::builder::PartialResult;
use crate::problem::Problem;
use crate::source::DocumentId;
use std::ops::Range;
use thiserror::Error;

/// The manifest text is not well-formed.
///
/// Raised by [`RawModelReader::read`](crate::RawModelReader::read). While a
/// document is being edited this is an expected, transient state: the
/// fallback path absorbs it silently instead of recording a problem.
#[derive(Debug, Clone, Error)]
#[error("manifest is not well-formed: {message}")]
pub struct RawParseError {
    pub message: String,
    /// Byte range of the offending input, when the parser can point at one.
    pub span: Option<Range<usize>>,
}

impl RawParseError {
    pub(crate) fn from_toml(err: toml_edit::TomlError) -> Self {
        Self {
            span: err.span(),
            message: err.to_string(),
        }
    }
}

/// Failure raised by the external project builder.
///
/// The variants encode the failure shapes the fallback policy dispatches on:
/// an aggregate model failure with no per-module results, a failure carrying
/// partial per-module results, an infrastructure fault, or cooperative
/// cancellation.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The model could not be assembled at all (missing parent, circular
    /// inheritance, unreadable source). `problems` carries the structural
    /// diagnostics; parse-level noise is expected to be filtered out by the
    /// builder so the fallback can attach these to a degraded project.
    #[error("model build failed for {id}: {message}")]
    Model {
        id: DocumentId,
        message: String,
        problems: Vec<Problem>,
    },

    /// The build failed but produced per-module partial results.
    #[error("project build failed for {id} with {} partial result(s)", results.len())]
    Partial {
        id: DocumentId,
        results: Vec<PartialResult>,
    },

    /// The collaborator is unavailable or misconfigured. Nothing is cached
    /// and waiting futures fail.
    #[error("project builder infrastructure failure: {0}")]
    Infrastructure(String),

    /// The build was cancelled at a cooperative checkpoint. A distinct
    /// terminal state, never logged as severe and never turned into a
    /// problem.
    #[error("build cancelled")]
    Cancelled,
}
