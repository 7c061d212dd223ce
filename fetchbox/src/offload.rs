//! Detached background task execution.
//!
//! The lifecycle override path fires the real network dispatch as a task
//! the caller never awaits. The manager keeps handles so tests and
//! shutdown paths can wait for or cancel in-flight work; task failures
//! are reported by the tasks themselves through `tracing`, never into the
//! original call's control flow.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::task::JoinHandle;

/// Manager for detached background tasks.
#[derive(Clone, Debug, Default)]
pub struct OffloadManager {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: DashMap<u64, JoinHandle<()>>,
    counter: AtomicU64,
}

impl OffloadManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` detached from the caller.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.counter.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            task.await;
            inner.tasks.remove(&id);
        });
        self.inner.tasks.insert(id, handle);
    }

    /// Number of tasks still running.
    pub fn active_count(&self) -> usize {
        self.inner
            .tasks
            .iter()
            .filter(|entry| !entry.is_finished())
            .count()
    }

    /// Waits until every tracked task has completed.
    pub async fn wait_all(&self) {
        loop {
            self.inner.tasks.retain(|_, handle| !handle.is_finished());
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Aborts every tracked task.
    pub fn cancel_all(&self) {
        for entry in self.inner.tasks.iter() {
            entry.abort();
        }
    }
}
