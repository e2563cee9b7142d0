//! Input parsers.
//!
//! Every CSV row and every GeoJSON feature is converted by its own task. Tasks are spawned on a
//! [`WorkerPool`], which bounds how many run at once and collects their results in input order.

pub mod csv;
mod geometry;
pub mod geojson;

pub use geometry::{parse_geometry, ParsedGeometry, Peel};

use crate::config::ConvertConfig;
use crate::dataset::Feature;
use crate::elevation::ElevationSource;
use crate::error::DrapeError;
use crate::mesh::{GridSampler, MeshBuilder};
use crate::normalize::Normalizer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Features produced by a parse phase.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Converted features in input order.
    pub features: Vec<Feature>,
    /// Number of rows or features that were dropped.
    pub dropped: usize,
}

/// Everything a row or feature task needs. Cheap to clone.
#[derive(Clone)]
pub(crate) struct ParseContext {
    pub normalizer: Normalizer,
    pub mesher: MeshBuilder,
    pub feature_timeout: Option<Duration>,
    pub max_workers: usize,
    pub lenient_numbers: bool,
    pub abort_on_mesh_failure: bool,
}

impl ParseContext {
    pub fn from_config(config: &ConvertConfig, elevation: Arc<dyn ElevationSource>) -> Self {
        Self {
            normalizer: Normalizer::new(elevation),
            mesher: MeshBuilder::new(Arc::new(GridSampler::from(&config.sampling))),
            feature_timeout: config.feature_timeout(),
            max_workers: config.worker_permits(),
            lenient_numbers: config.lenient_numbers,
            abort_on_mesh_failure: config.abort_on_mesh_failure,
        }
    }

    #[cfg(test)]
    pub fn new(elevation: Arc<dyn ElevationSource>) -> Self {
        Self::from_config(&ConvertConfig::default(), elevation)
    }
}

/// Result of one row or feature task: `Ok(None)` means the input was skipped on purpose.
pub(crate) type TaskResult = Result<Option<Feature>, DrapeError>;

/// Bounded set of row/feature tasks.
///
/// A permit is taken before a task is spawned, so no more than `permits` tasks exist at any
/// time. Dropping the pool aborts the tasks that are still running.
pub(crate) struct WorkerPool {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<(usize, TaskResult)>,
}

impl WorkerPool {
    pub fn new(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// Waits for a free slot and spawns the task for the input at `index`.
    pub async fn spawn<F>(&mut self, index: usize, task: F) -> Result<(), DrapeError>
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DrapeError::Task(e.to_string()))?;

        self.tasks.spawn(async move {
            let result = task.await;
            drop(permit);
            (index, result)
        });

        Ok(())
    }

    /// Waits for every task and returns the results ordered by input index.
    ///
    /// A panicked task fails the whole phase.
    pub async fn join(mut self) -> Result<Vec<(usize, TaskResult)>, DrapeError> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            results.push(joined?);
        }

        results.sort_by_key(|(index, _)| *index);
        Ok(results)
    }
}

/// Runs blocking work on the blocking thread pool, optionally bounded by a deadline.
///
/// When the deadline elapses the result is abandoned and [`DrapeError::Timeout`] is returned;
/// the blocking work itself runs to completion in the background.
pub(crate) async fn run_blocking<T, F>(deadline: Option<Duration>, work: F) -> Result<T, DrapeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DrapeError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, handle).await {
            Ok(joined) => joined?,
            Err(_) => Err(DrapeError::Timeout(deadline.as_millis() as u64)),
        },
        None => handle.await?,
    }
}

/// Splits task results into features, counting dropped inputs.
///
/// Errors are logged and dropped unless `is_fatal` says otherwise, in which case the first fatal
/// error is returned.
pub(crate) fn collect_features(
    results: Vec<(usize, TaskResult)>,
    what: &str,
    is_fatal: impl Fn(&DrapeError) -> bool,
) -> Result<ParseOutcome, DrapeError> {
    let mut outcome = ParseOutcome::default();
    for (index, result) in results {
        match result {
            Ok(Some(feature)) => outcome.features.push(feature),
            Ok(None) => outcome.dropped += 1,
            Err(err) if is_fatal(&err) => return Err(err),
            Err(err) => {
                log::warn!("Dropped {what} {index}: {err}");
                outcome.dropped += 1;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PointFeature;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn point(id: usize) -> Feature {
        Feature::Point(PointFeature {
            id: id.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_bounds_concurrency_and_keeps_order() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(3);

        for index in 0..20 {
            let running = running.clone();
            let peak = peak.clone();
            pool.spawn(index, async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis((20 - index as u64) % 7)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(point(index)))
            })
            .await
            .expect("spawned");
        }

        let results = pool.join().await.expect("joined");
        assert!(peak.load(Ordering::SeqCst) <= 3);
        let indices: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn blocking_deadline() {
        let result = run_blocking(Some(Duration::from_millis(10)), || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(1)
        })
        .await;
        assert_matches!(result, Err(DrapeError::Timeout(10)));

        let result = run_blocking(Some(Duration::from_secs(5)), || Ok(2)).await;
        assert_matches!(result, Ok(2));
    }

    #[tokio::test]
    async fn panicking_task_fails_the_phase() {
        let mut pool = WorkerPool::new(2);
        pool.spawn(0, async { Ok(None) }).await.expect("spawned");
        pool.spawn(1, async {
            if true {
                panic!("boom");
            }
            Ok(None)
        })
        .await
        .expect("spawned");
        assert_matches!(pool.join().await, Err(DrapeError::Task(_)));
    }

    #[test]
    fn collect_drops_and_fails() {
        let results = vec![
            (0, Ok(Some(point(0)))),
            (1, Err(DrapeError::Conversion("short".into()))),
            (2, Ok(None)),
            (3, Ok(Some(point(3)))),
        ];
        let outcome = collect_features(results, "row", |_| false).expect("collected");
        assert_eq!(outcome.features.len(), 2);
        assert_eq!(outcome.dropped, 2);

        let results = vec![(0, Err(DrapeError::Triangulation("flat".into())))];
        assert_matches!(
            collect_features(results, "feature", DrapeError::is_mesh_failure),
            Err(DrapeError::Triangulation(_))
        );
    }
}
