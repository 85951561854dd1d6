//! Scripted collaborators for cache and scheduler tests.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use pom_core::{
    BuildError, BuildKey, BuildOutcome, BuildRequest, CancelToken, Coordinates, DocumentId,
    DocumentProvider, DocumentVersion, ModelSource, PartialResult, Problem, Project,
    ProjectBuilder,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// In-memory document provider with mutable versions and content.
#[derive(Default)]
pub struct StaticProvider {
    docs: Mutex<HashMap<DocumentId, (DocumentVersion, Arc<str>)>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, uri: &str, version: DocumentVersion, text: &str) {
        self.docs
            .lock()
            .unwrap()
            .insert(DocumentId::new(uri), (version, Arc::from(text)));
    }
}

impl DocumentProvider for StaticProvider {
    fn current_version(&self, id: &DocumentId) -> Option<DocumentVersion> {
        self.docs.lock().unwrap().get(id).map(|(v, _)| *v)
    }

    fn current_text(&self, id: &DocumentId) -> Option<Arc<str>> {
        self.docs.lock().unwrap().get(id).map(|(_, t)| t.clone())
    }
}

/// Behavior of the scripted builder for one build key.
#[derive(Clone)]
pub enum Script {
    /// Produce a project whose coordinates encode the built version.
    Succeed,
    /// Fail with an aggregate model error carrying these problems.
    ModelFailure(Vec<Problem>),
    /// Fail with these per-module partial results.
    PartialFailure(Vec<PartialResult>),
    /// Fail with an infrastructure error.
    Infrastructure(String),
}

/// A `ProjectBuilder` driven by per-key scripts, with invocation counting,
/// invocation-order recording, and per-key gates for pausing builds.
#[derive(Default)]
pub struct ScriptedBuilder {
    scripts: Mutex<HashMap<BuildKey, Script>>,
    gates: Mutex<HashMap<BuildKey, Arc<Semaphore>>>,
    order: Mutex<Vec<BuildKey>>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, uri: &str, version: DocumentVersion, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(key(uri, version), script);
    }

    /// Makes builds for this key block until the returned semaphore receives
    /// a permit.
    pub fn gate(&self, uri: &str, version: DocumentVersion) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(key(uri, version), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Invocations that made it past the cancellation checkpoint behind the
    /// gate, i.e. were not aborted mid-build.
    pub fn completions(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn invocation_order(&self) -> Vec<BuildKey> {
        self.order.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProjectBuilder for ScriptedBuilder {
    async fn build(
        &self,
        source: &ModelSource,
        _request: &BuildRequest,
        cancel: &CancelToken,
    ) -> Result<BuildOutcome, BuildError> {
        cancel.checkpoint()?;
        let build_key = source.key();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.order.lock().unwrap().push(build_key.clone());

        let gate = self.gates.lock().unwrap().get(&build_key).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        cancel.checkpoint()?;
        self.completed.fetch_add(1, Ordering::SeqCst);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&build_key)
            .cloned()
            .unwrap_or(Script::Succeed);
        match script {
            Script::Succeed => Ok(BuildOutcome {
                project: Some(built_project(source)),
                problems: Vec::new(),
                resolution: None,
            }),
            Script::ModelFailure(problems) => Err(BuildError::Model {
                id: source.id.clone(),
                message: "model could not be assembled".into(),
                problems,
            }),
            Script::PartialFailure(results) => Err(BuildError::Partial {
                id: source.id.clone(),
                results,
            }),
            Script::Infrastructure(message) => Err(BuildError::Infrastructure(message)),
        }
    }
}

pub fn key(uri: &str, version: DocumentVersion) -> BuildKey {
    BuildKey {
        id: DocumentId::new(uri),
        version,
    }
}

/// A project whose coordinates record which snapshot produced it.
pub fn built_project(source: &ModelSource) -> Project {
    Project {
        coordinates: Some(Coordinates::new(
            "org.example",
            "app",
            source.version.to_string(),
        )),
        origin: Some(source.id.clone()),
        ..Project::default()
    }
}
