//! Per-monitor check scheduling

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::cadence::{Cadence, ScheduleError};
use crate::alerts::AlertTracker;
use crate::monitor::{CheckResult, Monitor, StatsCache};
use crate::probe::Probe;
use crate::store::{MonitorStore, ResultSink, StoreError};

/// Probe, persist and route one check.
///
/// Checks for the same monitor are serialized through a per-monitor gate so
/// scheduled, initial and on-demand checks never interleave.
struct CheckPipeline {
    probe: Arc<dyn Probe>,
    results: Arc<dyn ResultSink>,
    tracker: Arc<AlertTracker>,
    stats: Option<Arc<StatsCache>>,
    gates: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl CheckPipeline {
    fn gate(&self, monitor_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.gates.entry(monitor_id.to_string()).or_default().value())
    }

    async fn run(&self, monitor: &Monitor) -> CheckResult {
        let gate = self.gate(&monitor.id);
        let _guard = gate.lock().await;

        let result = self.probe.check(monitor).await;
        tracing::debug!(
            monitor_id = %monitor.id,
            status = result.status_code,
            response_time_ms = result.response_time_ms,
            is_up = result.is_up,
            "Check completed"
        );

        if let Err(e) = self.results.store_check_result(&result).await {
            tracing::error!(
                monitor_id = %monitor.id,
                error = %e,
                "Failed to store check result"
            );
        }

        if let Some(stats) = &self.stats {
            stats.invalidate(&monitor.id);
        }

        if result.is_up {
            self.tracker.handle_monitor_recovery(monitor).await;
        } else {
            self.tracker.handle_monitor_failure(monitor).await;
        }

        result
    }
}

struct ScheduledJob {
    interval_minutes: u32,
    /// Latest configuration, refreshed without rescheduling
    monitor: Arc<RwLock<Monitor>>,
    /// Dropping the sender cancels the job
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl ScheduledJob {
    fn cancel(self) -> JoinHandle<()> {
        drop(self.shutdown_tx);
        self.handle
    }
}

/// Running flag and jobs, changed together under one lock
#[derive(Default)]
struct JobTable {
    running: bool,
    jobs: HashMap<String, ScheduledJob>,
    /// Cancelled by `stop`, still awaited by `shutdown`
    stopped: Vec<JoinHandle<()>>,
}

impl JobTable {
    fn park(&mut self, job: ScheduledJob) {
        self.stopped.retain(|handle| !handle.is_finished());
        self.stopped.push(job.cancel());
    }
}

/// Recurring check scheduler, one task per active monitor
pub struct Scheduler {
    store: Arc<dyn MonitorStore>,
    pipeline: Arc<CheckPipeline>,
    table: Mutex<JobTable>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn MonitorStore>,
        results: Arc<dyn ResultSink>,
        probe: Arc<dyn Probe>,
        tracker: Arc<AlertTracker>,
    ) -> Self {
        Self {
            store,
            pipeline: Arc::new(CheckPipeline {
                probe,
                results,
                tracker,
                stats: None,
                gates: DashMap::new(),
            }),
            table: Mutex::new(JobTable::default()),
        }
    }

    /// Invalidate cached stats for a monitor after each of its checks
    pub fn with_stats_cache(mut self, stats: Arc<StatsCache>) -> Self {
        if let Some(pipeline) = Arc::get_mut(&mut self.pipeline) {
            pipeline.stats = Some(stats);
        }
        self
    }

    pub fn tracker(&self) -> &Arc<AlertTracker> {
        &self.pipeline.tracker
    }

    /// Schedule every active monitor.
    ///
    /// Returns the number of monitors scheduled; zero when already running.
    pub async fn start(&self) -> Result<usize, StoreError> {
        {
            let mut table = self.table.lock();
            if table.running {
                tracing::debug!("Scheduler already running");
                return Ok(0);
            }
            table.running = true;
        }

        let monitors = match self.store.list_active_monitors().await {
            Ok(monitors) => monitors,
            Err(e) => {
                self.table.lock().running = false;
                return Err(e);
            }
        };

        let mut scheduled = 0;
        for monitor in &monitors {
            if self.add_monitor(monitor).is_ok() && self.is_scheduled(&monitor.id) {
                scheduled += 1;
            }
        }

        tracing::info!(monitors = scheduled, "Scheduler started");
        Ok(scheduled)
    }

    /// Cancel every job. No check starts after this returns.
    ///
    /// Cancelled tasks are kept so a later `shutdown` can wait for their
    /// in-flight checks.
    pub fn stop(&self) {
        let mut table = self.table.lock();
        if !table.running {
            tracing::debug!("Scheduler not running");
            return;
        }
        table.running = false;

        let cancelled = table.jobs.len();
        table.stopped.retain(|handle| !handle.is_finished());
        let handles: Vec<JoinHandle<()>> =
            table.jobs.drain().map(|(_, job)| job.cancel()).collect();
        table.stopped.extend(handles);
        drop(table);

        tracing::info!(jobs = cancelled, "Scheduler stopped");
    }

    /// Stop and wait for in-flight checks to finish, including jobs
    /// cancelled by an earlier `stop`
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut table = self.table.lock();
            table.running = false;
            let mut handles = std::mem::take(&mut table.stopped);
            handles.extend(table.jobs.drain().map(|(_, job)| job.cancel()));
            handles
        };
        let count = handles.len();

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!(error = %e, "Check task panicked");
                }
            }
        }

        tracing::info!(jobs = count, "Scheduler shut down");
    }

    /// Schedule a monitor, replacing any existing job for it.
    ///
    /// Inactive monitors and a stopped scheduler are skipped. An invalid
    /// interval leaves the monitor unscheduled.
    pub fn add_monitor(&self, monitor: &Monitor) -> Result<(), ScheduleError> {
        if !monitor.is_active {
            tracing::debug!(monitor_id = %monitor.id, "Monitor inactive, not scheduling");
            return Ok(());
        }
        // checked under the same lock `stop` clears the flag with
        let mut table = self.table.lock();
        if !table.running {
            tracing::debug!(
                monitor_id = %monitor.id,
                "Scheduler not running, monitor will be scheduled on start"
            );
            return Ok(());
        }

        if let Some(previous) = table.jobs.remove(&monitor.id) {
            table.park(previous);
            tracing::debug!(monitor_id = %monitor.id, "Replacing existing job");
        }

        let cadence = match Cadence::from_interval(monitor.interval_minutes) {
            Ok(cadence) => cadence,
            Err(e) => {
                tracing::warn!(
                    monitor_id = %monitor.id,
                    error = %e,
                    "Failed to schedule monitor"
                );
                return Err(e);
            }
        };

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let shared = Arc::new(RwLock::new(monitor.clone()));
        let handle = tokio::spawn(run_job(
            Arc::clone(&self.pipeline),
            Arc::clone(&shared),
            cadence,
            shutdown_rx,
        ));

        table.jobs.insert(
            monitor.id.clone(),
            ScheduledJob {
                interval_minutes: monitor.interval_minutes,
                monitor: shared,
                shutdown_tx,
                handle,
            },
        );

        tracing::info!(
            monitor_id = %monitor.id,
            monitor = %monitor.name,
            interval_minutes = monitor.interval_minutes,
            cadence = ?cadence,
            "Monitor scheduled"
        );
        Ok(())
    }

    /// Apply a configuration change.
    ///
    /// An unchanged interval keeps the running job and only refreshes the
    /// configuration it checks with.
    pub fn update_monitor(&self, monitor: &Monitor) -> Result<(), ScheduleError> {
        if !monitor.is_active {
            self.remove_monitor(&monitor.id);
            return Ok(());
        }

        {
            let table = self.table.lock();
            if let Some(job) = table.jobs.get(&monitor.id) {
                if job.interval_minutes == monitor.interval_minutes {
                    *job.monitor.write() = monitor.clone();
                    return Ok(());
                }
            }
        }

        self.add_monitor(monitor)
    }

    /// Cancel a monitor's job; returns whether one existed
    pub fn remove_monitor(&self, monitor_id: &str) -> bool {
        let mut table = self.table.lock();
        match table.jobs.remove(monitor_id) {
            Some(job) => {
                table.park(job);
                drop(table);
                tracing::info!(monitor_id = %monitor_id, "Monitor unscheduled");
                true
            }
            None => false,
        }
    }

    /// Remove a deleted monitor's job, check gate and alert state
    pub fn forget_monitor(&self, monitor_id: &str) {
        self.remove_monitor(monitor_id);
        self.pipeline.gates.remove(monitor_id);
        self.pipeline.tracker.forget(monitor_id);
    }

    /// Check a monitor now, outside its schedule
    pub async fn perform_check(&self, monitor: &Monitor) -> CheckResult {
        self.pipeline.run(monitor).await
    }

    pub fn is_running(&self) -> bool {
        self.table.lock().running
    }

    pub fn active_monitor_count(&self) -> usize {
        self.table.lock().jobs.len()
    }

    pub fn scheduled_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.table.lock().jobs.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_scheduled(&self, monitor_id: &str) -> bool {
        self.table.lock().jobs.contains_key(monitor_id)
    }

    pub fn scheduled_interval(&self, monitor_id: &str) -> Option<u32> {
        self.table
            .lock()
            .jobs
            .get(monitor_id)
            .map(|job| job.interval_minutes)
    }
}

fn cancelled(shutdown_rx: &mut mpsc::Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty))
}

async fn run_job(
    pipeline: Arc<CheckPipeline>,
    monitor: Arc<RwLock<Monitor>>,
    cadence: Cadence,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut next_fixed = Instant::now();

    // immediate check so new monitors report without waiting an interval
    if cancelled(&mut shutdown_rx) {
        return;
    }
    let snapshot = monitor.read().clone();
    pipeline.run(&snapshot).await;

    loop {
        let deadline = match cadence {
            Cadence::Aligned { .. } => Instant::now() + cadence.next_delay(Utc::now()),
            Cadence::Fixed { period } => {
                next_fixed += period;
                // a check that overran its slot fires once, then realigns
                if next_fixed < Instant::now() {
                    next_fixed = Instant::now();
                }
                next_fixed
            }
        };

        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep_until(deadline) => {}
        }

        if cancelled(&mut shutdown_rx) {
            break;
        }

        let snapshot = monitor.read().clone();
        pipeline.run(&snapshot).await;
    }

    tracing::debug!(monitor_id = %monitor.read().id, "Check job stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Alert, AlertPolicy, EmailSender, MemoryMailTransport, Notifier};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Probe replaying a fixed status sequence, then 200 forever
    #[derive(Default)]
    struct ScriptedProbe {
        statuses: Mutex<VecDeque<u16>>,
        calls: AtomicUsize,
        latency: Option<Duration>,
    }

    impl ScriptedProbe {
        fn with_statuses(statuses: &[u16]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                ..Self::default()
            }
        }

        fn slow(latency: Duration) -> Self {
            Self {
                latency: Some(latency),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn check(&self, monitor: &Monitor) -> CheckResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let status = self.statuses.lock().pop_front().unwrap_or(200);
            let is_up = monitor.expects_status(status);
            let error = (!is_up).then(|| format!("Unexpected status code: {}", status));
            CheckResult::received(&monitor.id, status, 5, is_up, error, None)
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ResultSink for FailingSink {
        async fn store_check_result(&self, _result: &CheckResult) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }
    }

    struct Harness {
        scheduler: Arc<Scheduler>,
        store: Arc<MemoryStore>,
        probe: Arc<ScriptedProbe>,
        mail: Arc<MemoryMailTransport>,
    }

    fn harness_with(probe: ScriptedProbe, sink: Option<Arc<dyn ResultSink>>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let mail = Arc::new(MemoryMailTransport::new());
        let probe = Arc::new(probe);
        let notifier =
            Arc::new(Notifier::new(mail.clone(), store.clone(), EmailSender::default()).unwrap());
        let tracker = Arc::new(AlertTracker::new(
            AlertPolicy::default(),
            store.clone(),
            notifier,
        ));
        let results: Arc<dyn ResultSink> = sink.unwrap_or_else(|| store.clone());
        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            results,
            probe.clone(),
            tracker,
        ));
        Harness {
            scheduler,
            store,
            probe,
            mail,
        }
    }

    fn harness() -> Harness {
        harness_with(ScriptedProbe::default(), None)
    }

    async fn wait_for_checks(store: &MemoryStore, monitor_id: &str, count: usize) {
        for _ in 0..200 {
            if store.check_history(monitor_id).len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} checks for {}", count, monitor_id);
    }

    #[tokio::test]
    async fn test_start_schedules_active_monitors() {
        let h = harness();
        let active = Monitor::new("active", "https://example.com");
        let paused = Monitor::new("paused", "https://example.com").with_active(false);
        h.store.insert_monitor(active.clone()).unwrap();
        h.store.insert_monitor(paused.clone()).unwrap();

        assert_eq!(h.scheduler.start().await.unwrap(), 1);
        assert!(h.scheduler.is_running());
        assert!(h.scheduler.is_scheduled(&active.id));
        assert!(!h.scheduler.is_scheduled(&paused.id));

        // second start is a no-op
        assert_eq!(h.scheduler.start().await.unwrap(), 0);
        assert_eq!(h.scheduler.active_monitor_count(), 1);

        h.scheduler.stop();
    }

    #[tokio::test]
    async fn test_add_twice_keeps_one_job() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let monitor = Monitor::new("api", "https://example.com").with_interval(10);
        h.scheduler.add_monitor(&monitor).unwrap();
        h.scheduler.add_monitor(&monitor).unwrap();

        assert_eq!(h.scheduler.active_monitor_count(), 1);
        assert_eq!(h.scheduler.scheduled_ids(), vec![monitor.id.clone()]);
        assert_eq!(h.scheduler.scheduled_interval(&monitor.id), Some(10));

        h.scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_add_runs_initial_check() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let monitor = Monitor::new("api", "https://example.com");
        h.store.insert_monitor(monitor.clone()).unwrap();
        h.scheduler.add_monitor(&monitor).unwrap();

        wait_for_checks(&h.store, &monitor.id, 1).await;
        assert!(h.store.check_history(&monitor.id)[0].is_up);

        h.scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_add_skips_inactive_and_invalid() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let paused = Monitor::new("paused", "https://example.com").with_active(false);
        assert!(h.scheduler.add_monitor(&paused).is_ok());
        assert!(!h.scheduler.is_scheduled(&paused.id));

        let broken = Monitor::new("broken", "https://example.com").with_interval(0);
        assert_eq!(
            h.scheduler.add_monitor(&broken),
            Err(ScheduleError::InvalidInterval(0))
        );
        assert!(!h.scheduler.is_scheduled(&broken.id));
        assert_eq!(h.scheduler.active_monitor_count(), 0);

        h.scheduler.stop();
    }

    #[tokio::test]
    async fn test_add_before_start_is_deferred() {
        let h = harness();
        let monitor = Monitor::new("api", "https://example.com");
        h.scheduler.add_monitor(&monitor).unwrap();
        assert!(!h.scheduler.is_scheduled(&monitor.id));
    }

    #[tokio::test]
    async fn test_add_after_stop_is_ignored() {
        let h = harness();
        h.scheduler.start().await.unwrap();
        h.scheduler.stop();

        let monitor = Monitor::new("api", "https://example.com");
        h.scheduler.add_monitor(&monitor).unwrap();
        assert!(!h.scheduler.is_scheduled(&monitor.id));
        assert_eq!(h.scheduler.active_monitor_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_add_racing_stop_leaves_no_job() {
        let h = harness();
        let monitor = Monitor::new("api", "https://example.com").with_interval(60);

        for _ in 0..200 {
            h.scheduler.start().await.unwrap();
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let adder = {
                let scheduler = Arc::clone(&h.scheduler);
                let barrier = Arc::clone(&barrier);
                let monitor = monitor.clone();
                tokio::task::spawn_blocking(move || {
                    barrier.wait();
                    scheduler.add_monitor(&monitor)
                })
            };
            let stopper = {
                let scheduler = Arc::clone(&h.scheduler);
                let barrier = Arc::clone(&barrier);
                tokio::task::spawn_blocking(move || {
                    barrier.wait();
                    scheduler.stop();
                })
            };

            adder.await.unwrap().unwrap();
            stopper.await.unwrap();
            assert!(!h.scheduler.is_running());
            assert_eq!(h.scheduler.active_monitor_count(), 0);
        }

        h.scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_job_stops_firing() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let monitor = Monitor::new("api", "https://example.com").with_interval(7);
        h.scheduler.add_monitor(&monitor).unwrap();
        h.scheduler.add_monitor(&monitor).unwrap();

        // initial check plus one tick, from the surviving job only
        tokio::time::sleep(Duration::from_secs(7 * 60 + 1)).await;
        assert_eq!(h.probe.calls(), 2);

        tokio::time::sleep(Duration::from_secs(7 * 60)).await;
        assert_eq!(h.probe.calls(), 3);

        h.scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_after_stop_waits_for_in_flight_check() {
        let h = harness_with(ScriptedProbe::slow(Duration::from_secs(5)), None);
        let monitor = Monitor::new("api", "https://example.com");
        h.store.insert_monitor(monitor.clone()).unwrap();
        h.scheduler.start().await.unwrap();

        while h.probe.calls() == 0 {
            tokio::task::yield_now().await;
        }
        h.scheduler.stop();
        assert!(h.store.check_history(&monitor.id).is_empty());

        h.scheduler.shutdown().await;
        assert_eq!(h.store.check_history(&monitor.id).len(), 1);
        assert_eq!(h.probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_update_monitor() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let monitor = Monitor::new("api", "https://example.com").with_interval(5);
        h.scheduler.add_monitor(&monitor).unwrap();

        let renamed = Monitor {
            name: "renamed".to_string(),
            ..monitor.clone()
        };
        h.scheduler.update_monitor(&renamed).unwrap();
        assert_eq!(h.scheduler.scheduled_interval(&monitor.id), Some(5));
        {
            let table = h.scheduler.table.lock();
            assert_eq!(table.jobs[&monitor.id].monitor.read().name, "renamed");
        }

        let slower = renamed.clone().with_interval(15);
        h.scheduler.update_monitor(&slower).unwrap();
        assert_eq!(h.scheduler.scheduled_interval(&monitor.id), Some(15));
        assert_eq!(h.scheduler.active_monitor_count(), 1);

        let paused = slower.with_active(false);
        h.scheduler.update_monitor(&paused).unwrap();
        assert!(!h.scheduler.is_scheduled(&monitor.id));

        h.scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_and_stop() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let a = Monitor::new("a", "https://example.com");
        let b = Monitor::new("b", "https://example.com");
        h.scheduler.add_monitor(&a).unwrap();
        h.scheduler.add_monitor(&b).unwrap();

        assert!(h.scheduler.remove_monitor(&a.id));
        assert!(!h.scheduler.remove_monitor(&a.id));
        assert_eq!(h.scheduler.active_monitor_count(), 1);

        h.scheduler.stop();
        assert!(!h.scheduler.is_running());
        assert_eq!(h.scheduler.active_monitor_count(), 0);

        // stop is idempotent
        h.scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_cadence_fires_each_period() {
        let h = harness();
        h.scheduler.start().await.unwrap();

        let monitor = Monitor::new("api", "https://example.com").with_interval(7);
        h.scheduler.add_monitor(&monitor).unwrap();

        tokio::time::sleep(Duration::from_secs(7 * 60 * 2 + 1)).await;
        assert_eq!(h.probe.calls(), 3);

        h.scheduler.stop();
        tokio::time::sleep(Duration::from_secs(7 * 60 * 3)).await;
        assert_eq!(h.probe.calls(), 3);
    }

    #[tokio::test]
    async fn test_alert_sequence_over_ticks() {
        let h = harness_with(ScriptedProbe::with_statuses(&[200, 500, 500, 500, 200]), None);
        let monitor = Monitor::new("api", "https://example.com");
        h.store.insert_monitor(monitor.clone()).unwrap();
        h.store
            .insert_alert(Alert::email(&monitor.id, "ops@example.com"))
            .unwrap();

        let mut sent_per_tick = Vec::new();
        for _ in 0..5 {
            let before = h.mail.subjects().len();
            h.scheduler.perform_check(&monitor).await;
            let subjects = h.mail.subjects();
            sent_per_tick.push(subjects[before..].to_vec());
        }

        assert!(sent_per_tick[0].is_empty());
        assert!(sent_per_tick[1].is_empty());
        assert!(sent_per_tick[2].is_empty());
        assert_eq!(sent_per_tick[3].len(), 1);
        assert!(sent_per_tick[3][0].contains("is DOWN"));
        assert_eq!(sent_per_tick[4].len(), 1);
        assert!(sent_per_tick[4][0].contains("is UP"));

        let history = h.store.check_history(&monitor.id);
        let statuses: Vec<u16> = history.iter().rev().map(|c| c.status_code).collect();
        assert_eq!(statuses, vec![200, 500, 500, 500, 200]);
    }

    #[tokio::test]
    async fn test_failing_result_sink_keeps_pipeline_running() {
        let h = harness_with(
            ScriptedProbe::with_statuses(&[500, 500, 500]),
            Some(Arc::new(FailingSink)),
        );
        let monitor = Monitor::new("api", "https://example.com");
        h.store.insert_monitor(monitor.clone()).unwrap();
        h.store
            .insert_alert(Alert::email(&monitor.id, "ops@example.com"))
            .unwrap();

        for _ in 0..3 {
            let result = h.scheduler.perform_check(&monitor).await;
            assert!(!result.is_up);
        }

        assert!(h.store.check_history(&monitor.id).is_empty());
        assert_eq!(h.mail.subjects().len(), 1);
        assert_eq!(h.scheduler.tracker().consecutive_failures(&monitor.id), 3);
    }

    #[tokio::test]
    async fn test_perform_check_invalidates_stats() {
        let store = Arc::new(MemoryStore::new());
        let stats = Arc::new(StatsCache::default());
        let notifier = Arc::new(
            Notifier::new(
                Arc::new(MemoryMailTransport::new()),
                store.clone(),
                EmailSender::default(),
            )
            .unwrap(),
        );
        let tracker = Arc::new(AlertTracker::new(
            AlertPolicy::default(),
            store.clone(),
            notifier,
        ));
        let scheduler = Scheduler::new(
            store.clone(),
            store.clone(),
            Arc::new(ScriptedProbe::default()),
            tracker,
        )
        .with_stats_cache(stats.clone());

        let monitor = Monitor::new("api", "https://example.com");
        stats.put(crate::monitor::MonitorStats::compute(&monitor.id, &[], Utc::now()));
        assert!(stats.get(&monitor.id).is_some());

        scheduler.perform_check(&monitor).await;
        assert!(stats.get(&monitor.id).is_none());
    }
}
