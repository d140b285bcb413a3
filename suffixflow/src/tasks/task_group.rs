//! Bounded task group collecting one result per sample.

use crate::errors::StageError;
use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

type SampleHandle = (String, JoinHandle<Result<(), StageError>>);

/// A pool of per-sample tasks with at most `capacity` running at once.
///
/// Every spawned task is awaited by [`SampleTaskGroup::join`], which returns
/// one result per sample in submission order. A panicking task is reported
/// as [`StageError::TaskPanicked`] rather than lost.
pub struct SampleTaskGroup {
    /// Slots limiting concurrent tasks.
    permits: Arc<Semaphore>,
    /// The configured capacity.
    capacity: usize,
    /// Handles to spawned tasks, keyed by sample.
    handles: Mutex<Vec<SampleHandle>>,
}

impl SampleTaskGroup {
    /// Creates a group running at most `capacity` tasks at once.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Returns the maximum number of concurrent tasks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Spawns the work for one sample.
    ///
    /// The task starts immediately but waits for a free slot before polling
    /// `task`.
    pub fn spawn<Fut>(&self, sample: impl Into<String>, task: Fut)
    where
        Fut: Future<Output = Result<(), StageError>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(closed) => return Err(StageError::Other(closed.into())),
            };
            task.await
        });

        self.handles.lock().push((sample.into(), handle));
    }

    /// Spawns a body that may block its thread, such as one waiting on an
    /// external command.
    ///
    /// The slot is held while `body` runs on the blocking pool, so
    /// concurrency is bounded by the group's capacity and not by the number
    /// of runtime worker threads.
    pub fn spawn_blocking<F>(&self, sample: impl Into<String>, body: F)
    where
        F: FnOnce() -> Result<(), StageError> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(closed) => return Err(StageError::Other(closed.into())),
            };
            match tokio::task::spawn_blocking(body).await {
                Ok(result) => result,
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(join_error) => Err(StageError::Other(join_error.into())),
            }
        });

        self.handles.lock().push((sample.into(), handle));
    }

    /// Waits for every spawned task and returns their results in
    /// submission order.
    pub async fn join(&self) -> Vec<(String, Result<(), StageError>)> {
        let handles: Vec<SampleHandle> = std::mem::take(&mut *self.handles.lock());
        let (samples, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();

        let results = join_all(handles).await;
        samples
            .into_iter()
            .zip(results)
            .map(|(sample, joined)| {
                let result = match joined {
                    Ok(result) => result,
                    Err(join_error) => Err(StageError::TaskPanicked {
                        sample: sample.clone(),
                        message: join_error.to_string(),
                    }),
                };
                (sample, result)
            })
            .collect()
    }

    /// Returns the number of tasks not yet joined.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.handles.lock().len()
    }
}

impl std::fmt::Debug for SampleTaskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleTaskGroup")
            .field("capacity", &self.capacity)
            .field("task_count", &self.task_count())
            .finish()
    }
}
