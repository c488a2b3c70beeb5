//! Cancellable deferred tasks on the tokio runtime.
//!
//! Every timer the engine arms goes through a [`TaskScheduler`], so tearing
//! a meeting down is a single `cancel_all` instead of a hand-kept list of
//! handles. Finished tasks deregister themselves.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct TaskTable {
    tasks: Mutex<HashMap<TaskId, AbortHandle>>,
    next_id: AtomicU64,
}

impl TaskTable {
    fn remove(&self, id: TaskId) -> Option<AbortHandle> {
        match self.tasks.lock() {
            Ok(mut tasks) => tasks.remove(&id),
            Err(poisoned) => poisoned.into_inner().remove(&id),
        }
    }
}

/// Owns the abort handles of every pending timer it spawned.
#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
    table: Arc<TaskTable>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_tracked<F>(&self, task: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = TaskId(self.table.next_id.fetch_add(1, Ordering::Relaxed));
        let table = Arc::downgrade(&self.table);

        // The table lock is held across spawn so a task that finishes
        // immediately cannot deregister before it was registered.
        let mut tasks = match self.table.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let handle = tokio::spawn(async move {
            task.await;
            if let Some(table) = table.upgrade() {
                table.remove(id);
            }
        });
        tasks.insert(id, handle.abort_handle());
        id
    }

    /// Runs `task` once after `delay`.
    pub fn schedule_after<F>(&self, delay: Duration, task: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.spawn_tracked(async move {
            sleep(delay).await;
            task.await;
        });
        trace!(task = %id, delay_ms = delay.as_millis() as u64, "Scheduled deferred task");
        id
    }

    /// Calls `tick` every `period`, starting one period from now, until cancelled.
    pub fn schedule_every<F, Fut>(&self, period: Duration, mut tick: F) -> TaskId
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.spawn_tracked(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                tick().await;
            }
        });
        debug!(task = %id, period_ms = period.as_millis() as u64, "Scheduled periodic task");
        id
    }

    /// Aborts one task. Returns false if it already finished or was unknown.
    pub fn cancel(&self, id: TaskId) -> bool {
        match self.table.remove(id) {
            Some(handle) => {
                handle.abort();
                trace!(task = %id, "Cancelled task");
                true
            }
            None => false,
        }
    }

    /// Aborts every pending task and returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<AbortHandle> = match self.table.tasks.lock() {
            Ok(mut tasks) => tasks.drain().map(|(_, h)| h).collect(),
            Err(poisoned) => poisoned.into_inner().drain().map(|(_, h)| h).collect(),
        };
        for handle in &drained {
            handle.abort();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "Cancelled all pending tasks");
        }
        drained.len()
    }

    pub fn pending(&self) -> usize {
        match self.table.tasks.lock() {
            Ok(tasks) => tasks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        match self.table.tasks.lock() {
            Ok(tasks) => tasks.contains_key(&id),
            Err(poisoned) => poisoned.into_inner().contains_key(&id),
        }
    }
}
