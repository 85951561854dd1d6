//! Core types for the incremental project-model cache.
//!
//! This crate defines the data model (projects, problems, raw models), the
//! collaborator seams (`ProjectBuilder`, `DocumentProvider`), and the
//! cooperative cancellation token threaded through every collaborator call.
//! The cache and scheduler themselves live in `pom-cache`.

pub mod builder;
pub mod cancel;
pub mod error;
pub mod problem;
pub mod project;
pub mod raw;
pub mod source;

pub use builder::{BuildOutcome, BuildRequest, PartialResult, ProjectBuilder};
pub use cancel::CancelToken;
pub use error::{BuildError, RawParseError};
pub use problem::{Location, Problem, Severity};
pub use project::{
    BuildSection, Coordinates, Dependency, LoadedProject, Project, Repository, ResolutionResult,
    UnresolvedDependency,
};
pub use raw::{RawModel, RawModelReader};
pub use source::{BuildKey, DocumentId, DocumentProvider, DocumentVersion, ModelSource};
