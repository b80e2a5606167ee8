//! Tick-based batch scheduler
//!
//! Work is split into ticks of at most `per_tick` tasks. All tasks of a tick
//! run concurrently; the next tick starts only after every task of the current
//! one has finished and the cooldown has elapsed. This keeps the request rate
//! under the remote API limit without any per-request throttling.
//!
//! Tasks are plain futures, so a tick that is never reached never starts its
//! tasks. When a tick contains a failed task its siblings still run to
//! completion, then the first failure (in task order) is returned and no later
//! tick starts.

use cinesync_common::config::SchedulerSettings;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

/// Split `items` into consecutive groups of at most `per_tick`, preserving order
///
/// A `per_tick` of zero is treated as one. Never yields an empty group.
pub fn partition<T>(items: impl IntoIterator<Item = T>, per_tick: usize) -> Vec<Vec<T>> {
    let per_tick = per_tick.max(1);
    let mut ticks: Vec<Vec<T>> = Vec::new();
    for item in items {
        match ticks.last_mut() {
            Some(tick) if tick.len() < per_tick => tick.push(item),
            _ => {
                let mut tick = Vec::with_capacity(per_tick);
                tick.push(item);
                ticks.push(tick);
            }
        }
    }
    ticks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickScheduler {
    per_tick: usize,
    cooldown: Duration,
}

impl TickScheduler {
    pub fn new(per_tick: usize, cooldown: Duration) -> Self {
        Self {
            per_tick: per_tick.max(1),
            cooldown,
        }
    }

    pub fn from_settings(settings: &SchedulerSettings) -> Self {
        Self::new(settings.requests_per_tick, settings.tick_interval)
    }

    pub fn per_tick(&self) -> usize {
        self.per_tick
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn partition<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<Vec<T>> {
        partition(items, self.per_tick)
    }

    /// Run ticks in order, returning every task output in submission order
    pub async fn run<Fut, T, E>(&self, ticks: Vec<Vec<Fut>>) -> Result<Vec<T>, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let ticks: Vec<Vec<Fut>> = ticks.into_iter().filter(|tick| !tick.is_empty()).collect();
        let total_ticks = ticks.len();
        let mut outputs = Vec::new();

        for (index, tick) in ticks.into_iter().enumerate() {
            tracing::debug!(
                tick = index + 1,
                total_ticks,
                tasks = tick.len(),
                "Starting tick"
            );

            let mut first_error = None;
            for result in join_all(tick).await {
                match result {
                    Ok(output) => outputs.push(output),
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            if let Some(e) = first_error {
                tracing::warn!(tick = index + 1, total_ticks, "Tick failed, stopping");
                return Err(e);
            }

            if index + 1 < total_ticks {
                tracing::info!("Starting new tick after {:?}...", self.cooldown);
                tokio::time::sleep(self.cooldown).await;
            }
        }

        Ok(outputs)
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::from_settings(&SchedulerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[test]
    fn test_partition_sizes_and_order() {
        let ticks = partition(1..=7, 3);
        assert_eq!(ticks, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    }

    #[test]
    fn test_partition_exact_multiple_has_no_empty_tick() {
        let ticks = partition(0..78, 39);
        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|t| t.len() == 39));
    }

    #[test]
    fn test_partition_empty_and_zero() {
        assert!(partition(Vec::<i32>::new(), 39).is_empty());
        assert_eq!(partition(vec![1, 2], 0), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_default_matches_remote_limit() {
        let scheduler = TickScheduler::default();
        assert_eq!(scheduler.per_tick(), 39);
        assert_eq!(scheduler.cooldown(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_run_empty_completes_immediately() {
        let scheduler = TickScheduler::new(3, Duration::from_secs(60));
        let ticks: Vec<Vec<std::future::Ready<Result<(), ()>>>> = Vec::new();
        let start = Instant::now();
        assert_eq!(scheduler.run(ticks).await, Ok(vec![]));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_tasks_within_tick_run_concurrently() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = TickScheduler::new(3, Duration::from_millis(5));

        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(format!("start {i}"));
                    tokio::task::yield_now().await;
                    log.lock().unwrap().push(format!("end {i}"));
                    Ok::<_, ()>(i)
                }
            })
            .collect();

        let outputs = scheduler.run(scheduler.partition(tasks)).await.unwrap();
        assert_eq!(outputs, vec![0, 1, 2, 3, 4]);

        let log = log.lock().unwrap().clone();
        let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
        // every task of tick one starts before any of them ends
        assert!(position("start 2") < position("end 0"));
        // tick two waits for all of tick one
        assert!(position("end 0") < position("start 3"));
        assert!(position("end 2") < position("start 3"));
    }

    #[tokio::test]
    async fn test_cooldown_between_ticks_only() {
        let scheduler = TickScheduler::new(2, Duration::from_millis(40));
        let tasks: Vec<_> = (0..6).map(|i| async move { Ok::<_, ()>(i) }).collect();

        let start = Instant::now();
        scheduler.run(scheduler.partition(tasks)).await.unwrap();
        let elapsed = start.elapsed();

        // three ticks, two cooldowns
        assert!(elapsed >= Duration::from_millis(80), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_failure_stops_later_ticks_but_finishes_siblings() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let scheduler = TickScheduler::new(3, Duration::from_millis(1));

        let tasks: Vec<_> = (0..9)
            .map(|i| {
                let started = started.clone();
                let finished = finished.clone();
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    if i == 4 {
                        Err(format!("task {i} failed"))
                    } else {
                        Ok(i)
                    }
                }
            })
            .collect();

        let err = scheduler.run(scheduler.partition(tasks)).await.unwrap_err();
        assert_eq!(err, "task 4 failed");
        // ticks one and two ran fully, tick three never started
        assert_eq!(started.load(Ordering::SeqCst), 6);
        assert_eq!(finished.load(Ordering::SeqCst), 6);
    }
}
