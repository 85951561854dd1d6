//! Build execution and the raw-model fallback policy.
//!
//! The primary builder is authoritative, but its failure shapes are graded:
//! an aggregate model failure degrades to a lenient single-document parse of
//! the snapshot, a partial failure can still carry a usable per-module
//! result, and a mid-edit syntax error is expected and absorbed silently.

use crate::scheduler::{BuildScheduler, BuildTask, TaskOutcome};
use pom_core::{
    BuildError, BuildOutcome, BuildRequest, CancelToken, LoadedProject, ModelSource, Problem,
    Project, ProjectBuilder, RawModelReader,
};
use std::sync::Arc;

impl BuildScheduler {
    /// Runs the primary build for a dequeued task and applies the fallback
    /// ladder to its failure.
    pub(crate) async fn run_build(&self, task: &Arc<BuildTask>) -> TaskOutcome {
        let inner = self.inner();
        let request = BuildRequest::new();
        match inner.builder.build(&task.source, &request, &task.cancel).await {
            Ok(outcome) => {
                tracing::debug!(
                    key = %task.key,
                    problems = outcome.problems.len(),
                    "project build completed"
                );
                TaskOutcome::Loaded(Arc::new(loaded_from(outcome)))
            }
            Err(BuildError::Model { id, message, problems }) => {
                match inner.reader.read(&task.source.text) {
                    Ok(raw) => {
                        tracing::warn!(key = %task.key, %message, "model build failed, using raw manifest");
                        let project = Project::from_raw(raw, id);
                        TaskOutcome::Loaded(Arc::new(LoadedProject::new(
                            Some(project),
                            problems,
                            None,
                        )))
                    }
                    Err(parse) => {
                        // Expected while the document is mid-edit.
                        if inner.log_transient {
                            tracing::debug!(key = %task.key, error = %parse, "manifest not parseable");
                        }
                        TaskOutcome::Transient
                    }
                }
            }
            Err(BuildError::Partial { id, results }) => {
                if let Some(adopted) = adopt_single_partial(&results) {
                    tracing::debug!(key = %task.key, "adopted single partial build result");
                    return TaskOutcome::Loaded(Arc::new(adopted));
                }
                let err = BuildError::Partial { id, results };
                tracing::warn!(key = %task.key, error = %err, "project build degraded");
                TaskOutcome::Degraded(Arc::new(LoadedProject::new(
                    None,
                    vec![Problem::fatal(err.to_string())],
                    None,
                )))
            }
            Err(BuildError::Cancelled) => {
                tracing::trace!(key = %task.key, "build cancelled at checkpoint");
                TaskOutcome::Cancelled
            }
            Err(err @ BuildError::Infrastructure(_)) => {
                tracing::error!(key = %task.key, error = %err, "project build infrastructure failure");
                TaskOutcome::Failed(Arc::new(err))
            }
        }
    }
}

fn loaded_from(outcome: BuildOutcome) -> LoadedProject {
    LoadedProject::new(outcome.project, outcome.problems, outcome.resolution)
}

/// When a failed build carried exactly one per-module result that includes a
/// project, that result is usable as-is.
fn adopt_single_partial(results: &[pom_core::PartialResult]) -> Option<LoadedProject> {
    match results {
        [only] if only.project.is_some() => Some(LoadedProject::new(
            only.project.clone(),
            only.problems.clone(),
            None,
        )),
        _ => None,
    }
}

/// One-off build outside the scheduler: used by the synchronous snapshot
/// bypass and by explicit-content snapshot requests. Never cached, never
/// records problems; on failure the only recovery is adopting a single
/// usable partial result.
pub(crate) async fn build_uncached(
    builder: &dyn ProjectBuilder,
    reader: &RawModelReader,
    source: &ModelSource,
    request: &BuildRequest,
) -> Option<Arc<Project>> {
    let cancel = CancelToken::new();
    match builder.build(source, request, &cancel).await {
        Ok(outcome) => outcome.project.map(Arc::new),
        Err(BuildError::Partial { results, .. }) => adopt_single_partial(&results)
            .and_then(|loaded| loaded.project),
        Err(BuildError::Model { id, .. }) => reader
            .read(&source.text)
            .ok()
            .map(|raw| Arc::new(Project::from_raw(raw, id))),
        Err(_) => None,
    }
}
