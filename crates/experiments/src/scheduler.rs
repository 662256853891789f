//! Recurring per-test task scheduling.
//!
//! One background loop owns all timers and reacts to commands over an mpsc
//! channel; there is no per-test spawned task to leak. Removal is
//! acknowledged so callers can delete test state knowing the timer is gone.

use crate::error::{ExperimentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time;

/// Work fired once per interval for a scheduled test. Implementations are
/// host-supplied; failures are logged by the loop and the schedule keeps
/// running.
#[async_trait]
pub trait DailyJob: Send + Sync {
    async fn run(&self, test_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Clone)]
pub struct TaskScheduler {
    inner: Arc<TaskSchedulerInner>,
}

struct TaskSchedulerInner {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

enum SchedulerCommand {
    Schedule { test_id: String },
    Pause { test_id: String },
    Resume { test_id: String },
    Remove { test_id: String, ack: oneshot::Sender<()> },
    Shutdown,
}

struct JobState {
    next_fire: time::Instant,
    paused: bool,
}

impl TaskScheduler {
    #[must_use]
    pub fn start(job: Arc<dyn DailyJob>, config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        spawn_schedule_loop(job, config, command_rx);
        Self {
            inner: Arc::new(TaskSchedulerInner { command_tx }),
        }
    }

    /// Register a test; the first run fires one interval from now.
    /// Re-scheduling an existing test resets its timer.
    pub async fn schedule(&self, test_id: impl Into<String>) -> Result<()> {
        self.send(SchedulerCommand::Schedule {
            test_id: test_id.into(),
        })
        .await
    }

    /// Stop firing for a test while keeping its schedule entry.
    pub async fn pause(&self, test_id: impl Into<String>) -> Result<()> {
        self.send(SchedulerCommand::Pause {
            test_id: test_id.into(),
        })
        .await
    }

    /// Resume a paused test. The timer restarts from now rather than
    /// firing immediately for missed intervals.
    pub async fn resume(&self, test_id: impl Into<String>) -> Result<()> {
        self.send(SchedulerCommand::Resume {
            test_id: test_id.into(),
        })
        .await
    }

    /// Drop a test's schedule. Returns only after the loop has discarded
    /// the timer, so the caller may delete test state without leaving an
    /// orphaned callback behind.
    pub async fn remove(&self, test_id: impl Into<String>) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(SchedulerCommand::Remove {
            test_id: test_id.into(),
            ack,
        })
        .await?;
        done.await
            .map_err(|_| ExperimentError::SchedulerStopped("remove not acknowledged".to_string()))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(SchedulerCommand::Shutdown).await
    }

    async fn send(&self, command: SchedulerCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|_| ExperimentError::SchedulerStopped("command channel closed".to_string()))
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(SchedulerCommand::Shutdown);
        }
    }
}

fn spawn_schedule_loop(
    job: Arc<dyn DailyJob>,
    config: SchedulerConfig,
    mut command_rx: mpsc::Receiver<SchedulerCommand>,
) {
    tokio::spawn(async move {
        let mut jobs: HashMap<String, JobState> = HashMap::new();

        loop {
            let next_deadline = jobs
                .values()
                .filter(|state| !state.paused)
                .map(|state| state.next_fire)
                .min();

            tokio::select! {
                Some(command) = command_rx.recv() => {
                    match command {
                        SchedulerCommand::Schedule { test_id } => {
                            log::info!("Scheduling recurring task for test {test_id}");
                            jobs.insert(test_id, JobState {
                                next_fire: time::Instant::now() + config.interval,
                                paused: false,
                            });
                        }
                        SchedulerCommand::Pause { test_id } => {
                            if let Some(state) = jobs.get_mut(&test_id) {
                                state.paused = true;
                            } else {
                                log::warn!("Pause for unscheduled test {test_id}");
                            }
                        }
                        SchedulerCommand::Resume { test_id } => {
                            if let Some(state) = jobs.get_mut(&test_id) {
                                state.paused = false;
                                state.next_fire = time::Instant::now() + config.interval;
                            } else {
                                log::warn!("Resume for unscheduled test {test_id}");
                            }
                        }
                        SchedulerCommand::Remove { test_id, ack } => {
                            jobs.remove(&test_id);
                            let _ = ack.send(());
                        }
                        SchedulerCommand::Shutdown => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if next_deadline.is_some() => {
                    let now = time::Instant::now();
                    let due: Vec<String> = jobs
                        .iter()
                        .filter(|(_, state)| !state.paused && state.next_fire <= now)
                        .map(|(id, _)| id.clone())
                        .collect();
                    for test_id in due {
                        if let Err(err) = job.run(&test_id).await {
                            log::warn!("Scheduled task for test {test_id} failed: {err}");
                        }
                        if let Some(state) = jobs.get_mut(&test_id) {
                            state.next_fire = now + config.interval;
                        }
                    }
                }
            }
        }
        log::debug!("Task scheduler loop stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingJob {
        runs: Mutex<Vec<String>>,
        count: AtomicUsize,
    }

    impl CountingJob {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                runs: Mutex::new(Vec::new()),
                count: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DailyJob for CountingJob {
        async fn run(&self, test_id: &str) -> Result<()> {
            self.runs.lock().unwrap().push(test_id.to_string());
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingJob;

    #[async_trait]
    impl DailyJob for FailingJob {
        async fn run(&self, test_id: &str) -> Result<()> {
            Err(ExperimentError::UnknownTest(test_id.to_string()))
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_millis(50),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_job_fires_once_per_interval() {
        let job = CountingJob::new();
        let scheduler = TaskScheduler::start(job.clone(), fast_config());
        scheduler.schedule("t1").await.unwrap();

        time::sleep(Duration::from_millis(175)).await;
        assert_eq!(job.count(), 3);
        assert!(job.runs.lock().unwrap().iter().all(|id| id == "t1"));

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_firing_and_resume_restarts() {
        let job = CountingJob::new();
        let scheduler = TaskScheduler::start(job.clone(), fast_config());
        scheduler.schedule("t1").await.unwrap();

        time::sleep(Duration::from_millis(75)).await;
        assert_eq!(job.count(), 1);

        scheduler.pause("t1").await.unwrap();
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(job.count(), 1);

        scheduler.resume("t1").await.unwrap();
        time::sleep(Duration::from_millis(75)).await;
        assert_eq!(job.count(), 2);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn remove_stops_the_timer_before_returning() {
        let job = CountingJob::new();
        let scheduler = TaskScheduler::start(job.clone(), fast_config());
        scheduler.schedule("t1").await.unwrap();
        scheduler.schedule("t2").await.unwrap();

        scheduler.remove("t1").await.unwrap();
        time::sleep(Duration::from_millis(120)).await;

        let runs = job.runs.lock().unwrap();
        assert!(runs.iter().all(|id| id == "t2"));
        assert!(!runs.is_empty());
        drop(runs);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_job_keeps_its_schedule() {
        let scheduler = TaskScheduler::start(Arc::new(FailingJob), fast_config());
        scheduler.schedule("t1").await.unwrap();

        // Two intervals pass without the loop dying.
        time::sleep(Duration::from_millis(120)).await;
        scheduler.schedule("t2").await.unwrap();
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_report_stopped() {
        let job = CountingJob::new();
        let scheduler = TaskScheduler::start(job, fast_config());
        scheduler.shutdown().await.unwrap();

        // The loop exits; subsequent sends fail once the receiver is gone.
        time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            scheduler.schedule("t1").await,
            Err(ExperimentError::SchedulerStopped(_))
        ));
    }
}
