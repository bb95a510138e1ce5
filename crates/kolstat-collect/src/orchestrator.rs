//! Bounded-concurrency job dispatch with pause/stop control.
//!
//! N worker loops share one mutex-guarded job queue. A claim is a single
//! critical section that finds the next Pending job and marks it InProgress,
//! so no job is ever processed twice. Stop is cooperative: loops check the
//! token between jobs and discard any result that lands after stop was
//! raised, leaving that job InProgress rather than recording a half-told
//! outcome.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;

use crate::accounts::AccountStatus;
use crate::aggregate::ResultRecord;
use crate::error::CollectError;
use crate::job::{CollectionJob, JobStatus};
use crate::license::LicenseGate;
use crate::worker::{process_one, CollectContext, JobFailure};

const PAUSE_POLL: Duration = Duration::from_millis(100);

struct QueueState {
    jobs: Vec<CollectionJob>,
    next: usize,
}

/// Shared claim queue. `next` only ever moves forward; claimed jobs are
/// written back by index.
struct JobQueue {
    inner: Mutex<QueueState>,
}

impl JobQueue {
    fn new(jobs: Vec<CollectionJob>) -> Self {
        Self {
            inner: Mutex::new(QueueState { jobs, next: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claims the next Pending job, marking it InProgress in the same
    /// critical section.
    fn claim(&self) -> Option<(usize, String)> {
        let mut state = self.lock();
        while state.next < state.jobs.len() {
            let idx = state.next;
            state.next += 1;
            if state.jobs[idx].status == JobStatus::Pending {
                state.jobs[idx].status = JobStatus::InProgress;
                return Some((idx, state.jobs[idx].identity_id.clone()));
            }
        }
        None
    }

    fn complete(&self, idx: usize, record: ResultRecord, failure_notes: Vec<String>) {
        let mut state = self.lock();
        let job = &mut state.jobs[idx];
        job.status = JobStatus::Completed;
        job.record = record;
        job.failure_notes = failure_notes;
        job.completed_at = Some(Utc::now());
    }

    fn fail(&self, idx: usize, error: String) {
        let mut state = self.lock();
        let job = &mut state.jobs[idx];
        job.status = JobStatus::Failed;
        job.error = Some(error);
        job.completed_at = Some(Utc::now());
    }

    /// Whether any unclaimed Pending job remains.
    fn has_pending(&self) -> bool {
        let state = self.lock();
        state.jobs[state.next..]
            .iter()
            .any(|j| j.status == JobStatus::Pending)
    }

    fn into_jobs(self) -> Vec<CollectionJob> {
        match self.inner.into_inner() {
            Ok(state) => state.jobs,
            Err(poisoned) => poisoned.into_inner().jobs,
        }
    }
}

/// What one run did, for operators and persistence.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub quota_exhausted: bool,
    /// Ids of credentials the platform rejected during this run.
    pub invalidated_accounts: Vec<String>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub jobs: Vec<CollectionJob>,
    pub summary: RunSummary,
}

pub struct Orchestrator {
    concurrency: usize,
}

impl Orchestrator {
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Runs every Pending job in `jobs` to a terminal state, or until stop or
    /// quota exhaustion ends the run early.
    ///
    /// # Errors
    ///
    /// [`CollectError::LicenseDenied`] when the gate refuses, before any
    /// network activity.
    pub async fn run(
        &self,
        ctx: Arc<CollectContext>,
        gate: &dyn LicenseGate,
        jobs: Vec<CollectionJob>,
    ) -> Result<RunOutcome, CollectError> {
        let decision = gate.check_allowed();
        if !decision.allowed {
            return Err(CollectError::LicenseDenied {
                tier: decision.tier,
            });
        }

        let initially_invalid: HashSet<String> = ctx
            .pool
            .snapshot()
            .into_iter()
            .filter(|a| a.status == AccountStatus::Invalid)
            .map(|a| a.id)
            .collect();

        let total = jobs.len();
        tracing::info!(total, concurrency = self.concurrency, "collection run starting");

        let queue = JobQueue::new(jobs);
        let quota_exhausted = AtomicBool::new(false);

        let loops = (0..self.concurrency)
            .map(|worker| worker_loop(worker, &ctx, &queue, &quota_exhausted));
        futures::future::join_all(loops).await;

        let jobs = queue.into_jobs();
        let completed = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .count();
        let failed = jobs.iter().filter(|j| j.status == JobStatus::Failed).count();

        let invalidated_accounts: Vec<String> = ctx
            .pool
            .snapshot()
            .into_iter()
            .filter(|a| a.status == AccountStatus::Invalid && !initially_invalid.contains(&a.id))
            .map(|a| a.id)
            .collect();

        let summary = RunSummary {
            completed,
            failed,
            quota_exhausted: quota_exhausted.load(Ordering::SeqCst),
            invalidated_accounts,
        };
        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            quota_exhausted = summary.quota_exhausted,
            "collection run finished"
        );

        Ok(RunOutcome { jobs, summary })
    }
}

async fn worker_loop(
    worker: usize,
    ctx: &CollectContext,
    queue: &JobQueue,
    quota_exhausted: &AtomicBool,
) {
    loop {
        if ctx.cancel.is_stopped() || quota_exhausted.load(Ordering::SeqCst) {
            return;
        }
        while ctx.cancel.is_paused() {
            if ctx.cancel.is_stopped() {
                return;
            }
            tokio::time::sleep(PAUSE_POLL).await;
        }

        let Some((idx, identity_id)) = queue.claim() else {
            return;
        };
        tracing::debug!(worker, identity = %identity_id, "job claimed");

        let result = process_one(ctx, &identity_id).await;

        // A stop raised mid-job means the outcome was produced against a run
        // that no longer exists; discard it.
        if ctx.cancel.is_stopped() {
            tracing::debug!(worker, identity = %identity_id, "stop raised mid-job, result discarded");
            return;
        }

        match result {
            Ok(success) => {
                tracing::info!(
                    worker,
                    identity = %identity_id,
                    fields = success.record.len(),
                    misses = success.failure_notes.len(),
                    "job completed"
                );
                queue.complete(idx, success.record, success.failure_notes);
            }
            Err(JobFailure::QuotaExhausted) => {
                tracing::warn!(worker, identity = %identity_id, "credential quota exhausted, run winding down");
                queue.fail(idx, JobFailure::QuotaExhausted.to_string());
                quota_exhausted.store(true, Ordering::SeqCst);
                return;
            }
            Err(failure) => {
                tracing::warn!(worker, identity = %identity_id, error = %failure, "job failed");
                queue.fail(idx, failure.to_string());
            }
        }

        // Inter-job throttle, skipped when no further claim can follow.
        if queue.has_pending() {
            tokio::time::sleep(ctx.throttle).await;
        }
    }
}
