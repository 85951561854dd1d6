use crate::problem::Problem;
use crate::raw::RawModel;
use crate::source::DocumentId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// `group:name:version` coordinates identifying a project or dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Coordinates {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A remote artifact repository declared by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub id: String,
    pub url: String,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// The build section of a resolved project. Empty when the manifest did not
/// declare one (or the fallback path could not recover it).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildSection {
    pub directory: Option<String>,
    pub final_name: Option<String>,
    pub plugins: Vec<Coordinates>,
}

/// A declared dependency, with the version the external builder resolved it
/// to when resolution succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub coordinates: Coordinates,
    pub scope: Option<String>,
    pub resolved_version: Option<String>,
}

/// Outcome of dependency resolution for one build, possibly partial.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    pub resolved: Vec<Dependency>,
    pub unresolved: Vec<UnresolvedDependency>,
}

/// A dependency the resolver could not complete, with the reason.
#[derive(Debug, Clone)]
pub struct UnresolvedDependency {
    pub dependency: Dependency,
    pub reason: String,
}

/// The fully analyzed, inheritance- and property-resolved project model
/// derived from one manifest document.
///
/// A `Project` is produced either by the external `ProjectBuilder` or, in
/// degraded form, by [`Project::from_raw`] when the primary build fails
/// structurally.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub coordinates: Option<Coordinates>,
    pub parent: Option<Coordinates>,
    pub repositories: Vec<Repository>,
    pub build: BuildSection,
    pub dependencies: Vec<Dependency>,
    pub properties: BTreeMap<String, String>,
    /// Identity of the manifest this project was built from.
    pub origin: Option<DocumentId>,
}

impl Project {
    /// Synthesizes a minimal best-effort project from a leniently parsed raw
    /// model: deduplicated repository list, an empty build section when none
    /// was parseable, and the originating file identity attached.
    ///
    /// Inheritance is not walked and properties are not interpolated; the
    /// result exists so consumers always have something to query while the
    /// primary build cannot produce a model.
    pub fn from_raw(raw: RawModel, origin: DocumentId) -> Self {
        let mut repositories: Vec<Repository> = Vec::with_capacity(raw.repositories.len());
        for repo in raw.repositories {
            if !repositories.contains(&repo) {
                repositories.push(repo);
            }
        }
        Self {
            coordinates: raw.coordinates,
            parent: raw.parent,
            repositories,
            build: raw.build.unwrap_or_default(),
            dependencies: Vec::new(),
            properties: raw.properties,
            origin: Some(origin),
        }
    }
}

/// The immutable result of one completed build attempt.
///
/// The project may be absent (the attempt produced only problems), the
/// problem list may be empty, and resolution data is present only when the
/// builder performed dependency resolution.
#[derive(Debug, Clone, Default)]
pub struct LoadedProject {
    pub project: Option<Arc<Project>>,
    pub problems: Vec<Problem>,
    pub resolution: Option<ResolutionResult>,
}

impl LoadedProject {
    pub fn new(
        project: Option<Project>,
        problems: Vec<Problem>,
        resolution: Option<ResolutionResult>,
    ) -> Self {
        Self {
            project: project.map(Arc::new),
            problems,
            resolution,
        }
    }

    /// The outcome delivered for a transient mid-edit failure: no project and
    /// no problems, leaving previously cached state untouched.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn project(&self) -> Option<Arc<Project>> {
        self.project.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_repos(repos: Vec<Repository>) -> RawModel {
        RawModel {
            coordinates: None,
            parent: None,
            repositories: repos,
            build: None,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_from_raw_deduplicates_repositories() {
        let raw = raw_with_repos(vec![
            Repository::new("central", "https://repo.example.org/releases"),
            Repository::new("central", "https://repo.example.org/releases"),
            Repository::new("snapshots", "https://repo.example.org/snapshots"),
        ]);
        let project = Project::from_raw(raw, DocumentId::new("file:///p/project.toml"));
        assert_eq!(project.repositories.len(), 2);
    }

    #[test]
    fn test_from_raw_empty_build_section() {
        let raw = raw_with_repos(vec![]);
        let project = Project::from_raw(raw, DocumentId::new("file:///p/project.toml"));
        assert_eq!(project.build, BuildSection::default());
    }

    #[test]
    fn test_from_raw_attaches_origin() {
        let raw = raw_with_repos(vec![]);
        let id = DocumentId::new("file:///p/project.toml");
        let project = Project::from_raw(raw, id.clone());
        assert_eq!(project.origin, Some(id));
    }

    #[test]
    fn test_coordinates_display() {
        let c = Coordinates::new("org.example", "app", "1.0.0");
        assert_eq!(c.to_string(), "org.example:app:1.0.0");
    }

    #[test]
    fn test_empty_loaded_project() {
        let loaded = LoadedProject::empty();
        assert!(loaded.project.is_none());
        assert!(loaded.problems.is_empty());
        assert!(loaded.resolution.is_none());
    }
}
