//! Background scheduler for wall-clock jobs.
//!
//! A job runs on its own tokio task: sleep until the next firing, run the job
//! to completion, repeat. Runs never overlap. The returned handle stops the
//! loop; dropping it has the same effect.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, LocalResult, Offset, TimeZone};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::services::calendar::WeeklySchedule;

pub trait Schedule: Send + Sync + 'static {
    /// Time to wait from `now` until the next firing.
    fn until_next(&self, now: DateTime<Local>) -> Duration;
}

impl Schedule for WeeklySchedule {
    fn until_next(&self, now: DateTime<Local>) -> Duration {
        wait_until_next(self, &now)
    }
}

/// Elapsed time from `now` until the next firing, resolved in `now`'s zone.
///
/// The firing is a wall-clock time, so it is mapped back to an instant before
/// subtracting: across a DST change the wait is an hour longer or shorter than
/// the naive difference. A repeated wall-clock time fires on its first
/// occurrence; one skipped by a spring-forward gap fires at `now`'s offset.
fn wait_until_next<Tz: TimeZone>(schedule: &WeeklySchedule, now: &DateTime<Tz>) -> Duration {
    let next = schedule.next_after(now.naive_local());
    let fire_at = match now.timezone().from_local_datetime(&next) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.naive_utc(),
        LocalResult::None => {
            next - chrono::Duration::seconds(now.offset().fix().local_minus_utc() as i64)
        }
    };
    (fire_at - now.naive_utc()).to_std().unwrap_or_default()
}

pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler. A job already running is allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Scheduler task ended abnormally");
        }
    }
}

pub fn spawn<S, F, Fut>(name: &'static str, schedule: S, mut job: F) -> SchedulerHandle
where
    S: Schedule,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        loop {
            let wait = schedule.until_next(Local::now());
            tracing::info!(job = name, next_in_secs = wait.as_secs(), "Next scheduled run");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown_rx.changed() => break,
            }

            tracing::info!(job = name, "Scheduled job firing");
            job().await;
        }
        tracing::info!(job = name, "Scheduler stopped");
    });

    SchedulerHandle { shutdown, task }
}
