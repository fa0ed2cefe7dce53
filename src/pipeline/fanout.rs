//! Fan-out/fan-in over panels.
//!
//! Every stage spawns one task per panel on a [`JoinSet`], caps how many run at
//! once with a [`Semaphore`], and drains the set in completion order. A failed
//! or panicked item is logged and reported; it never stops its siblings, and
//! [`WorkerPool::run`] only returns once every item has finished.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::PanelError;
use crate::story::{Panel, PanelOutcome};

/// What a stage produced, in completion order.
#[derive(Debug)]
pub struct StageReport<T> {
    /// Panels whose item succeeded, with their output.
    pub succeeded: Vec<(Panel, T)>,
    /// Panels whose item failed, with the reason.
    pub failed: Vec<(Panel, PanelError)>,
}

impl<T> Default for StageReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Runs per-panel work items concurrently, at most `limit` at a time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WorkerPool {
    limit: Option<NonZeroUsize>,
}

impl WorkerPool {
    /// `None` gives every item of a stage its own worker.
    pub fn new(limit: Option<NonZeroUsize>) -> Self {
        Self { limit }
    }

    /// Number of workers used for a stage of `items` work items.
    pub fn workers_for(&self, items: usize) -> usize {
        match self.limit {
            Some(limit) => limit.get().min(items.max(1)),
            None => items.max(1),
        }
    }

    /// Runs `work` once per item and waits for all of them.
    pub async fn run<In, T, F, Fut>(
        &self,
        stage: &str,
        items: Vec<(Panel, In)>,
        work: F,
    ) -> StageReport<T>
    where
        In: Send + 'static,
        T: Send + 'static,
        F: Fn(Panel, In) -> Fut,
        Fut: Future<Output = PanelOutcome<T>> + Send + 'static,
    {
        let total = items.len();
        let permits = Arc::new(Semaphore::new(self.workers_for(total)));
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::with_capacity(total);

        for (panel, input) in items {
            let item = work(panel.clone(), input);
            let permits = Arc::clone(&permits);
            let handle = tasks.spawn(async move {
                // never closed
                let _permit = permits.acquire_owned().await;
                item.await
            });
            in_flight.insert(handle.id(), panel);
        }

        let mut report = StageReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    in_flight.remove(&id);
                    outcome
                }
                Err(err) => {
                    let Some(panel) = in_flight.remove(&err.id()) else {
                        error!("{stage}: lost track of a failed worker: {err}");
                        continue;
                    };
                    PanelOutcome {
                        panel,
                        result: Err(PanelError::WorkerPanicked(err.to_string())),
                    }
                }
            };

            match outcome.result {
                Ok(value) => report.succeeded.push((outcome.panel, value)),
                Err(err) => {
                    warn!("{stage}: panel {} failed: {err}", outcome.panel.index);
                    report.failed.push((outcome.panel, err));
                }
            }
        }

        info!(
            "{stage}: {} of {total} panels succeeded",
            report.succeeded.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn panel(index: u32) -> Panel {
        Panel {
            index,
            character: format!("character {index}"),
            scene: format!("scene {index}"),
            text: format!("text {index}"),
        }
    }

    fn items(indices: &[u32]) -> Vec<(Panel, ())> {
        indices.iter().map(|i| (panel(*i), ())).collect()
    }

    #[tokio::test]
    async fn collects_in_completion_order() {
        let pool = WorkerPool::new(None);
        let report = pool
            .run("test", items(&[1, 2, 3]), |panel, ()| async move {
                // panel 1 finishes last, panel 3 first
                let delay = 20 * u64::from(4 - panel.index);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                let index = panel.index;
                PanelOutcome {
                    panel,
                    result: Ok(index),
                }
            })
            .await;

        let order: Vec<u32> = report.succeeded.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_affect_siblings() {
        let pool = WorkerPool::new(None);
        let report = pool
            .run("test", items(&[1, 2, 3, 4]), |panel, ()| async move {
                let result = if panel.index == 2 {
                    Err(PanelError::MissingImageUrl("none".to_string()))
                } else {
                    Ok(panel.index * 10)
                };
                PanelOutcome { panel, result }
            })
            .await;

        let mut ok: Vec<u32> = report.succeeded.iter().map(|(p, _)| p.index).collect();
        ok.sort_unstable();
        assert_eq!(ok, vec![1, 3, 4]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.index, 2);
    }

    #[tokio::test]
    #[allow(clippy::panic)]
    async fn panicking_worker_is_a_tagged_failure() {
        let pool = WorkerPool::new(None);
        let report: StageReport<u32> = pool
            .run("test", items(&[1, 2]), |panel, ()| async move {
                if panel.index == 1 {
                    panic!("worker exploded");
                }
                PanelOutcome {
                    panel,
                    result: Ok(2),
                }
            })
            .await;

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, panel(1));
        assert!(matches!(report.failed[0].1, PanelError::WorkerPanicked(_)));
    }

    #[tokio::test]
    async fn never_exceeds_the_configured_bound() {
        let pool = WorkerPool::new(NonZeroUsize::new(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let report = pool
            .run("test", items(&[1, 2, 3, 4, 5, 6]), |panel, ()| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    PanelOutcome {
                        panel,
                        result: Ok(()),
                    }
                }
            })
            .await;

        assert_eq!(report.succeeded.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn waits_for_every_item_before_returning() {
        let pool = WorkerPool::new(None);
        let finished = Arc::new(AtomicUsize::new(0));

        let report = pool
            .run("test", items(&[1, 2, 3]), |panel, ()| {
                let finished = Arc::clone(&finished);
                async move {
                    tokio::time::sleep(Duration::from_millis(5 * u64::from(panel.index))).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    PanelOutcome {
                        panel,
                        result: Err::<(), _>(PanelError::MissingImageUrl("x".to_string())),
                    }
                }
            })
            .await;

        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(report.failed.len(), 3);
    }

    #[tokio::test]
    async fn empty_stage_returns_empty_report() {
        let report: StageReport<()> = WorkerPool::new(None)
            .run("test", Vec::<(Panel, ())>::new(), |panel, ()| async move {
                PanelOutcome {
                    panel,
                    result: Ok(()),
                }
            })
            .await;
        assert!(report.succeeded.is_empty());
        assert!(report.failed.is_empty());
    }

    #[test]
    fn worker_count_follows_limit_and_stage_size() {
        assert_eq!(WorkerPool::new(None).workers_for(5), 5);
        assert_eq!(WorkerPool::new(None).workers_for(0), 1);
        assert_eq!(WorkerPool::new(NonZeroUsize::new(2)).workers_for(5), 2);
        assert_eq!(WorkerPool::new(NonZeroUsize::new(8)).workers_for(3), 3);
    }
}
