use std::fmt;
use std::sync::Arc;

/// Monotonically increasing edit version of a document, supplied by the
/// editor session. Never decreases for a given identity.
pub type DocumentVersion = i32;

/// Normalized identity of a manifest document: its canonical URI.
///
/// Normalization lowercases the scheme and strips a trailing slash so that
/// spelling variants of the same URI map to one cache entry. The ordering is
/// plain lexical order, which the scheduler uses as a deterministic
/// tie-breaker between equal-priority tasks.
///
/// # Examples
///
/// ```
/// use pom_core::DocumentId;
///
/// let a = DocumentId::new("FILE:///ws/app/project.toml/");
/// let b = DocumentId::new("file:///ws/app/project.toml");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(uri: &str) -> Self {
        let trimmed = uri.trim_end_matches('/');
        let normalized = match trimmed.find(':') {
            Some(idx) if trimmed[..idx].chars().any(|c| c.is_ascii_uppercase()) => {
                let mut s = trimmed[..idx].to_ascii_lowercase();
                s.push_str(&trimmed[idx..]);
                s
            }
            _ => trimmed.to_string(),
        };
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

/// An immutable snapshot of a document's content at a specific version.
///
/// Builds operate on snapshots so that a build is unaffected by edits that
/// arrive while it is queued or executing.
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub id: DocumentId,
    pub version: DocumentVersion,
    pub text: Arc<str>,
}

impl ModelSource {
    pub fn new(id: DocumentId, version: DocumentVersion, text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            version,
            text: text.into(),
        }
    }

    /// The deduplication key for build requests on this snapshot.
    pub fn key(&self) -> BuildKey {
        BuildKey {
            id: self.id.clone(),
            version: self.version,
        }
    }
}

/// Deduplication identity for a build request: (document identity, version).
///
/// An explicit content fingerprint rather than an object-identity hash, so
/// two requests for the same document version always coalesce and requests
/// for distinct versions never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub id: DocumentId,
    pub version: DocumentVersion,
}

impl fmt::Display for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.id, self.version)
    }
}

/// Access to the editor session's view of open documents.
///
/// Implemented by the host; the cache only ever observes versions and content
/// snapshots through this trait.
pub trait DocumentProvider: Send + Sync {
    /// Current edit version of the document, or `None` if the document is not
    /// known to the session.
    fn current_version(&self, id: &DocumentId) -> Option<DocumentVersion>;

    /// Current text of the document, or `None` if unavailable.
    fn current_text(&self, id: &DocumentId) -> Option<Arc<str>>;
}
