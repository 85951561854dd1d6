//! Versioned project cache keyed by document identity.
//!
//! Each manifest document has one entry tracking the last edit version a
//! build was attempted against, the most recently completed attempt, and the
//! in-flight build (if any). Completed outcomes are folded into the entry
//! lazily on access; an attempt is adopted only when it is not older than the
//! already-adopted version, so a stale build finishing late can never regress
//! the visible state.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::execute::build_uncached;
use crate::scheduler::{BuildHandle, BuildScheduler, TaskOutcome};
use dashmap::DashMap;
use pom_core::{
    BuildRequest, DocumentId, DocumentProvider, DocumentVersion, LoadedProject, ModelSource,
    Problem, Project, ProjectBuilder,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// One completed build attempt adopted by an entry.
struct Attempt {
    version: DocumentVersion,
    loaded: Arc<LoadedProject>,
}

/// An in-flight build tracked by an entry. The entry keeps its own handle so
/// the build completes and populates the cache even if every external
/// requester abandons it.
struct Pending {
    version: DocumentVersion,
    handle: BuildHandle,
}

#[derive(Default)]
struct ProjectEntry {
    /// Highest version a build was dispatched for. `None` forces the next
    /// request to rebuild.
    last_checked_version: Option<DocumentVersion>,
    attempt: Option<Attempt>,
    pending: Option<Pending>,
}

impl ProjectEntry {
    /// Folds the pending build's outcome into the entry if it has completed.
    fn fold(&mut self) {
        let Some(outcome) = self.pending.as_ref().and_then(|p| p.handle.peek()) else {
            return;
        };
        let Some(pending) = self.pending.take() else {
            return;
        };
        let version = pending.version;
        let stale = self
            .attempt
            .as_ref()
            .is_some_and(|attempt| version < attempt.version);
        match outcome {
            TaskOutcome::Loaded(loaded) => {
                if !stale {
                    self.attempt = Some(Attempt { version, loaded });
                }
            }
            TaskOutcome::Degraded(loaded) => {
                // Recorded for diagnostics, but freshness is reset so the
                // next request retries this version.
                if !stale {
                    self.attempt = Some(Attempt { version, loaded });
                }
                self.reset_freshness(version);
            }
            TaskOutcome::Transient => {
                // Mid-edit parse failure: previous value stays untouched and
                // the version stays checked, so the retry waits for the next
                // edit instead of hot-looping.
            }
            TaskOutcome::Failed(_) | TaskOutcome::Cancelled => {
                self.reset_freshness(version);
            }
        }
    }

    fn reset_freshness(&mut self, version: DocumentVersion) {
        if self.last_checked_version == Some(version) {
            self.last_checked_version = None;
        }
    }

    fn is_current_for(&self, version: DocumentVersion) -> bool {
        self.last_checked_version
            .is_some_and(|checked| checked >= version)
    }
}

/// Incremental build cache for project models.
///
/// The cache owns a [`BuildScheduler`] and a [`DocumentProvider`] view of the
/// editor session. All lookups are by normalized [`DocumentId`]; a build is
/// dispatched only when the document's current version is newer than the last
/// version a build was attempted against.
///
/// Created stopped; call [`start`](Self::start) once the host is ready to run
/// builds.
pub struct ProjectCache {
    entries: DashMap<DocumentId, Arc<Mutex<ProjectEntry>>>,
    scheduler: BuildScheduler,
    provider: Arc<dyn DocumentProvider>,
}

impl ProjectCache {
    pub fn new(
        builder: Arc<dyn ProjectBuilder>,
        provider: Arc<dyn DocumentProvider>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            scheduler: BuildScheduler::new(builder, config),
            provider,
        }
    }

    /// Begins executing queued builds.
    pub fn start(&self) {
        self.scheduler.start();
    }

    /// Stops dispatching builds; executing builds run to completion.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub fn scheduler(&self) -> &BuildScheduler {
        &self.scheduler
    }

    fn entry(&self, id: &DocumentId) -> Arc<Mutex<ProjectEntry>> {
        self.entries.entry(id.clone()).or_default().clone()
    }

    fn locked(entry: &Arc<Mutex<ProjectEntry>>) -> MutexGuard<'_, ProjectEntry> {
        let mut guard = entry.lock().unwrap();
        guard.fold();
        guard
    }

    /// The result of the latest build attempt for `id`, building first if the
    /// document has changed since the last attempt.
    ///
    /// Attaches to the in-flight build when one covers the current version.
    /// Absence of a project in the result is not an error: a transient
    /// mid-edit failure resolves to an empty [`LoadedProject`].
    pub async fn get_or_build(&self, id: &DocumentId) -> Result<Arc<LoadedProject>> {
        let Some(version) = self.provider.current_version(id) else {
            return Err(CacheError::MissingDocument(id.clone()));
        };
        let entry = self.entry(id);
        let handle = {
            let mut guard = Self::locked(&entry);
            if guard.is_current_for(version) {
                if let Some(pending) = &guard.pending {
                    pending.handle.clone()
                } else if let Some(attempt) = &guard.attempt {
                    return Ok(Arc::clone(&attempt.loaded));
                } else {
                    // Checked, no attempt recorded: the last outcome was
                    // transient and absorbed.
                    return Ok(Arc::new(LoadedProject::empty()));
                }
            } else {
                let Some(text) = self.provider.current_text(id) else {
                    return Err(CacheError::MissingDocument(id.clone()));
                };
                let source = ModelSource::new(id.clone(), version, text);
                let handle = self.scheduler.submit(source);
                guard.last_checked_version = Some(version);
                guard.pending = Some(Pending {
                    version,
                    handle: handle.clone(),
                });
                handle
            }
        };
        handle.wait().await
    }

    /// The latest successfully built project for `id`, building first when
    /// the document has changed.
    pub async fn project(&self, id: &DocumentId) -> Option<Arc<Project>> {
        self.get_or_build(id).await.ok().and_then(|l| l.project())
    }

    /// The cached project for `id` if it is current, otherwise an immediate
    /// build on the calling task that bypasses the scheduler queue.
    ///
    /// The bypass build is never cached and records no problems; it may
    /// duplicate work already queued, which is accepted for the latency
    /// guarantee. Returns `None` when no usable model can be produced.
    pub async fn snapshot(&self, id: &DocumentId) -> Option<Arc<Project>> {
        let version = self.provider.current_version(id)?;
        {
            let entry = self.entry(id);
            let guard = Self::locked(&entry);
            if guard.is_current_for(version) {
                if let Some(project) = guard.attempt.as_ref().and_then(|a| a.loaded.project()) {
                    return Some(project);
                }
            }
        }
        let text = self.provider.current_text(id)?;
        let source = ModelSource::new(id.clone(), version, text);
        self.snapshot_for_source(&source, &BuildRequest::new()).await
    }

    /// One-off build of explicit content with an explicit request, e.g. for
    /// profile-activation what-if queries. Never cached.
    pub async fn snapshot_for_source(
        &self,
        source: &ModelSource,
        request: &BuildRequest,
    ) -> Option<Arc<Project>> {
        let inner = self.scheduler.inner();
        build_uncached(inner.builder.as_ref(), &inner.reader, source, request).await
    }

    /// Problems of the most recently completed attempt for `id`, regardless
    /// of whether it produced a project. Empty when no attempt is recorded.
    pub fn problems(&self, id: &DocumentId) -> Vec<Problem> {
        let Some(entry) = self.entries.get(id).map(|e| e.value().clone()) else {
            return Vec::new();
        };
        let guard = Self::locked(&entry);
        guard
            .attempt
            .as_ref()
            .map(|a| a.loaded.problems.clone())
            .unwrap_or_default()
    }

    /// Every currently cached project, in unspecified order.
    pub fn projects(&self) -> Vec<Arc<Project>> {
        let entries: Vec<_> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries
            .iter()
            .filter_map(|entry| {
                let guard = Self::locked(entry);
                guard.attempt.as_ref().and_then(|a| a.loaded.project())
            })
            .collect()
    }
}
