//! Background jobs that run on a fixed period until cancelled.
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to a spawned periodic job.
///
/// Dropping the handle cancels the job; `shutdown` cancels it and waits for
/// the current run to finish.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawns `job` to run every `period`. The first run happens one period
    /// after spawning.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start(name, period, false, job)
    }

    /// Like [`PeriodicTask::spawn`], but the first run starts right away.
    pub fn spawn_now<F, Fut>(name: &'static str, period: Duration, job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start(name, period, true, job)
    }

    fn start<F, Fut>(name: &'static str, period: Duration, immediate: bool, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !immediate {
                timer.tick().await; // Skip the first immediate tick.
            }

            debug!("Periodic task {} started with period {:?}", name, period);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = timer.tick() => {
                        tokio::select! {
                            _ = child.cancelled() => break,
                            _ = job() => {}
                        }
                    }
                }
            }
            debug!("Periodic task {} stopped", name);
        });

        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Periodic task {} ended abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_runs_repeatedly_until_shutdown() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let task = PeriodicTask::spawn("counter", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(task.is_running());
        task.shutdown().await;

        let after_shutdown = runs.load(Ordering::SeqCst);
        assert!(after_shutdown >= 2, "ran {} times", after_shutdown);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_long_job() {
        let task = PeriodicTask::spawn("sleeper", Duration::from_millis(5), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        let started = std::time::Instant::now();
        task.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_spawn_now_runs_before_first_period() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let task = PeriodicTask::spawn_now("eager", Duration::from_secs(3600), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::timeout(Duration::from_secs(2), async {
            while runs.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        task.shutdown().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let task = PeriodicTask::spawn("dropped", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(task.name(), "dropped");
        drop(task);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
