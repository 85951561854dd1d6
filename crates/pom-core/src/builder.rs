use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::problem::Problem;
use crate::project::{Project, ResolutionResult};
use crate::source::ModelSource;
use async_trait::async_trait;

/// Options for one project build.
///
/// The default request resolves dependencies; snapshot consumers that only
/// need structure can skip resolution to bound latency.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub resolve_dependencies: bool,
    /// Profile ids to activate during the build.
    pub active_profiles: Vec<String>,
}

impl BuildRequest {
    pub fn new() -> Self {
        Self {
            resolve_dependencies: true,
            active_profiles: Vec::new(),
        }
    }

    pub fn without_resolution() -> Self {
        Self {
            resolve_dependencies: false,
            active_profiles: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.active_profiles.push(profile.into());
        self
    }
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Successful outcome of a primary build: a project (possibly absent), the
/// problems encountered, and resolution data when requested.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub project: Option<Project>,
    pub problems: Vec<Problem>,
    pub resolution: Option<ResolutionResult>,
}

/// A per-module partial result attached to [`BuildError::Partial`].
#[derive(Debug, Clone, Default)]
pub struct PartialResult {
    pub project: Option<Project>,
    pub problems: Vec<Problem>,
}

/// The external modeling collaborator: turns a manifest snapshot into a
/// resolved project.
///
/// Implementations perform inheritance resolution, property expansion and
/// dependency/plugin resolution, typically with long blocking I/O, and are
/// expected to honor `cancel` at their internal checkpoints. The builder's
/// internal state may not be request-isolated, which is why the scheduler
/// bounds its concurrency instead of running unbounded parallel builds.
#[async_trait]
pub trait ProjectBuilder: Send + Sync {
    async fn build(
        &self,
        source: &ModelSource,
        request: &BuildRequest,
        cancel: &CancelToken,
    ) -> Result<BuildOutcome, BuildError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_resolves() {
        assert!(BuildRequest::new().resolve_dependencies);
        assert!(BuildRequest::new().active_profiles.is_empty());
    }

    #[test]
    fn test_request_without_resolution() {
        assert!(!BuildRequest::without_resolution().resolve_dependencies);
    }

    #[test]
    fn test_request_with_profile() {
        let request = BuildRequest::new().with_profile("ci");
        assert_eq!(request.active_profiles, vec!["ci".to_string()]);
    }
}
