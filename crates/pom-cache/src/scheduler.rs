//! Priority build scheduler.
//!
//! Executes project builds asynchronously on a bounded pool of tokio tasks,
//! at most once per [`BuildKey`] at any instant, ordered by priority. All
//! concurrent requesters of one key share a single task and observe the same
//! outcome through [`BuildHandle`]s.
//!
//! # Ordering
//!
//! The ready queue is ordered by priority descending; ties are broken by
//! lexical document-identity order (then version) so equal-priority dequeue
//! order is deterministic. Every duplicate submission of a queued key bumps
//! its priority, so documents under active interactive demand overtake
//! speculative background builds. There is no FIFO guarantee across keys.
//!
//! # Cancellation
//!
//! Dropping (or [`cancel`](BuildHandle::cancel)-ing) a handle releases one
//! waiter; when the last waiter is gone the task's [`CancelToken`] fires. A
//! task cancelled before it is dequeued never invokes the builder; a task
//! cancelled mid-build aborts at the builder's next cooperative checkpoint.

use crate::config::CacheConfig;
use crate::error::CacheError;
use pom_core::{
    BuildError, BuildKey, CancelToken, LoadedProject, ModelSource, ProjectBuilder, RawModelReader,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Terminal outcome of one build task, shared by every waiter.
#[derive(Debug, Clone)]
pub(crate) enum TaskOutcome {
    /// Usable result: the owning cache entry adopts it and becomes fresh.
    Loaded(Arc<LoadedProject>),
    /// Problems-only result: recorded for diagnostics, but the entry is not
    /// marked fresh, so the next request retries.
    Degraded(Arc<LoadedProject>),
    /// Mid-edit parse failure: expected, silent, nothing recorded.
    Transient,
    /// Infrastructure or unexpected failure: waiters fail, nothing cached.
    Failed(Arc<BuildError>),
    /// Every waiter released before completion.
    Cancelled,
}

/// A queued or executing unit of build work.
pub(crate) struct BuildTask {
    pub(crate) key: BuildKey,
    pub(crate) source: ModelSource,
    pub(crate) cancel: CancelToken,
    priority: AtomicI32,
    waiters: AtomicUsize,
    tx: watch::Sender<Option<TaskOutcome>>,
}

impl BuildTask {
    fn new(key: BuildKey, source: ModelSource) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            key,
            source,
            cancel: CancelToken::new(),
            priority: AtomicI32::new(0),
            waiters: AtomicUsize::new(0),
            tx,
        }
    }

    fn bump_priority(&self) -> i32 {
        self.priority.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn priority(&self) -> i32 {
        self.priority.load(Ordering::SeqCst)
    }
}

/// Shared future for one build task.
///
/// Every requester of a key holds its own handle; [`wait`](Self::wait)
/// resolves to the task's shared outcome. Dropping a handle without waiting
/// counts as cancelling that requester's interest — once every handle is
/// released the task is cancelled.
pub struct BuildHandle {
    task: Arc<BuildTask>,
    rx: watch::Receiver<Option<TaskOutcome>>,
    held: bool,
}

impl BuildHandle {
    fn attach(task: &Arc<BuildTask>) -> Self {
        task.waiters.fetch_add(1, Ordering::SeqCst);
        Self {
            task: Arc::clone(task),
            rx: task.tx.subscribe(),
            held: true,
        }
    }

    pub fn key(&self) -> &BuildKey {
        &self.task.key
    }

    /// Explicitly releases this requester's interest in the build. Other
    /// requesters sharing the task are unaffected unless this was the last
    /// one.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if self.task.waiters.fetch_sub(1, Ordering::SeqCst) == 1 {
            tracing::trace!(key = %self.task.key, "last waiter released, cancelling task");
            self.task.cancel.cancel();
        }
    }

    /// Completed outcome, if any, without waiting.
    pub(crate) fn peek(&self) -> Option<TaskOutcome> {
        self.rx.borrow().clone()
    }

    /// Waits for the task to complete.
    ///
    /// A transient mid-edit failure resolves to an empty [`LoadedProject`];
    /// degraded results resolve successfully with their problems attached.
    pub async fn wait(mut self) -> Result<Arc<LoadedProject>, CacheError> {
        let outcome = loop {
            if let Some(outcome) = self.rx.borrow_and_update().clone() {
                break outcome;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without an outcome; treat as cancellation.
                return Err(CacheError::Cancelled);
            }
        };
        match outcome {
            TaskOutcome::Loaded(loaded) | TaskOutcome::Degraded(loaded) => Ok(loaded),
            TaskOutcome::Transient => Ok(Arc::new(LoadedProject::empty())),
            TaskOutcome::Failed(err) => Err(CacheError::Build(err)),
            TaskOutcome::Cancelled => Err(CacheError::Cancelled),
        }
    }
}

impl Clone for BuildHandle {
    fn clone(&self) -> Self {
        Self::attach(&self.task)
    }
}

impl Drop for BuildHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Queue and dedup index, guarded by one mutex so "already queued for this
/// key" checks and enqueue/priority-bump are atomic.
struct SchedulerState {
    ready: Vec<Arc<BuildTask>>,
    in_progress: HashMap<BuildKey, Arc<BuildTask>>,
    worker_limit: usize,
    running: usize,
}

pub(crate) struct SchedulerInner {
    state: Mutex<SchedulerState>,
    pub(crate) builder: Arc<dyn ProjectBuilder>,
    pub(crate) reader: RawModelReader,
    configured_limit: usize,
    bump_on_duplicate: bool,
    pub(crate) log_transient: bool,
}

/// The priority build scheduler.
///
/// Created stopped: queued tasks begin executing only after
/// [`start`](Self::start). Cloning is cheap and shares the same queue.
///
/// # Examples
///
/// ```no_run
/// use pom_cache::{BuildScheduler, CacheConfig};
/// use pom_core::{DocumentId, ModelSource, ProjectBuilder};
/// use std::sync::Arc;
///
/// # async fn example(builder: Arc<dyn ProjectBuilder>) -> Result<(), pom_cache::CacheError> {
/// let scheduler = BuildScheduler::new(builder, &CacheConfig::default());
/// scheduler.start();
///
/// let source = ModelSource::new(DocumentId::new("file:///ws/project.toml"), 1, "[project]");
/// let loaded = scheduler.submit(source).wait().await?;
/// println!("{} problem(s)", loaded.problems.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BuildScheduler {
    inner: Arc<SchedulerInner>,
}

impl BuildScheduler {
    pub fn new(builder: Arc<dyn ProjectBuilder>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(SchedulerState {
                    ready: Vec::new(),
                    in_progress: HashMap::new(),
                    worker_limit: 0,
                    running: 0,
                }),
                builder,
                reader: RawModelReader::new(),
                configured_limit: config.worker_limit,
                bump_on_duplicate: config.bump_priority_on_duplicate,
                log_transient: config.log_transient_parse_failures,
            }),
        }
    }

    pub(crate) fn inner(&self) -> &SchedulerInner {
        &self.inner
    }

    /// Submits a build for the given snapshot, coalescing with any task
    /// already queued or executing for the same key.
    ///
    /// A duplicate submission bumps the existing task's priority (when the
    /// bump policy is enabled) and attaches to its future; otherwise a new
    /// priority-0 task is enqueued.
    pub fn submit(&self, source: ModelSource) -> BuildHandle {
        let key = source.key();
        let handle = {
            let mut state = self.inner.state.lock().unwrap();
            if let Some(task) = state.in_progress.get(&key) {
                if task.cancel.is_cancelled() {
                    // Every waiter released before the task ran; a new
                    // submission must not attach to the dead task.
                    let dead = Arc::clone(task);
                    state.in_progress.remove(&key);
                    state.ready.retain(|t| !Arc::ptr_eq(t, &dead));
                    tracing::trace!(key = %key, "evicted cancelled task on resubmit");
                } else {
                    if self.inner.bump_on_duplicate {
                        let priority = task.bump_priority();
                        tracing::trace!(key = %key, priority, "coalesced duplicate build request");
                    }
                    return BuildHandle::attach(task);
                }
            }
            let task = Arc::new(BuildTask::new(key.clone(), source));
            let handle = BuildHandle::attach(&task);
            state.in_progress.insert(key, Arc::clone(&task));
            state.ready.push(task);
            handle
        };
        self.dispatch();
        handle
    }

    /// Raises the worker bound to the configured limit; queued tasks begin
    /// executing in priority order. With a configured limit of zero the
    /// scheduler stays paused.
    pub fn start(&self) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.worker_limit == 0 {
                state.worker_limit = self.inner.configured_limit;
                tracing::debug!(limit = state.worker_limit, "build scheduler started");
            }
        }
        self.dispatch();
    }

    /// Drops the worker bound to zero. No new task begins; tasks already
    /// executing run to completion.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.worker_limit > 0 {
            state.worker_limit = 0;
            tracing::debug!("build scheduler stopped");
        }
    }

    /// Dequeues and spawns ready tasks while worker capacity remains.
    fn dispatch(&self) {
        loop {
            let task = {
                let mut state = self.inner.state.lock().unwrap();
                if state.running >= state.worker_limit || state.ready.is_empty() {
                    return;
                }
                let idx = best_task_index(&state.ready);
                state.running += 1;
                state.ready.swap_remove(idx)
            };
            let scheduler = self.clone();
            tokio::spawn(async move {
                scheduler.execute(task).await;
            });
        }
    }

    async fn execute(&self, task: Arc<BuildTask>) {
        let outcome = if task.cancel.is_cancelled() {
            // Cancelled while queued: the builder is never invoked.
            tracing::trace!(key = %task.key, "skipping cancelled task");
            TaskOutcome::Cancelled
        } else {
            self.run_build(&task).await
        };

        {
            let mut state = self.inner.state.lock().unwrap();
            // A cancelled task may already have been replaced by a fresh
            // submission for the same key; only remove our own entry.
            if state
                .in_progress
                .get(&task.key)
                .is_some_and(|current| Arc::ptr_eq(current, &task))
            {
                state.in_progress.remove(&task.key);
            }
            state.running -= 1;
        }
        let _ = task.tx.send(Some(outcome));
        self.dispatch();
    }
}

/// Index of the next task to dequeue: highest priority, ties broken by
/// lexical identity order, then version.
fn best_task_index(ready: &[Arc<BuildTask>]) -> usize {
    let mut best = 0;
    for idx in 1..ready.len() {
        if precedes(&ready[idx], &ready[best]) {
            best = idx;
        }
    }
    best
}

fn precedes(a: &BuildTask, b: &BuildTask) -> bool {
    let (pa, pb) = (a.priority(), b.priority());
    if pa != pb {
        return pa > pb;
    }
    if a.key.id != b.key.id {
        return a.key.id < b.key.id;
    }
    a.key.version < b.key.version
}

#[cfg(test)]
mod tests {
    use super::*;
    use pom_core::DocumentId;

    fn task(uri: &str, version: i32, priority: i32) -> Arc<BuildTask> {
        let source = ModelSource::new(DocumentId::new(uri), version, "");
        let t = BuildTask::new(source.key(), source);
        t.priority.store(priority, Ordering::SeqCst);
        Arc::new(t)
    }

    #[test]
    fn test_highest_priority_dequeued_first() {
        let ready = vec![
            task("file:///a.toml", 1, 0),
            task("file:///b.toml", 1, 2),
            task("file:///c.toml", 1, 1),
        ];
        assert_eq!(best_task_index(&ready), 1);
    }

    #[test]
    fn test_tie_broken_by_lexical_identity() {
        let ready = vec![
            task("file:///b.toml", 1, 1),
            task("file:///a.toml", 1, 1),
        ];
        assert_eq!(best_task_index(&ready), 1);
    }

    #[test]
    fn test_identity_tie_broken_by_version() {
        let ready = vec![
            task("file:///a.toml", 5, 0),
            task("file:///a.toml", 3, 0),
        ];
        assert_eq!(best_task_index(&ready), 1);
    }

    #[test]
    fn test_bump_priority_increments() {
        let t = task("file:///a.toml", 1, 0);
        assert_eq!(t.bump_priority(), 1);
        assert_eq!(t.bump_priority(), 2);
        assert_eq!(t.priority(), 2);
    }

    #[test]
    fn test_last_handle_release_cancels_task() {
        let t = task("file:///a.toml", 1, 0);
        let h1 = BuildHandle::attach(&t);
        let h2 = h1.clone();
        drop(h1);
        assert!(!t.cancel.is_cancelled());
        h2.cancel();
        assert!(t.cancel.is_cancelled());
    }

    #[test]
    fn test_peek_empty_before_completion() {
        let t = task("file:///a.toml", 1, 0);
        let h = BuildHandle::attach(&t);
        assert!(h.peek().is_none());
    }
}
