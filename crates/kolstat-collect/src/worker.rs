//! One collection job, end to end.
//!
//! A job borrows one credential, performs the mandatory identity fetch, then
//! fans out over the optional analytics fetches concurrently. Optional
//! fetches fail independently; as long as the identity fetch succeeded the
//! job completes with whatever subset came back, plus a note per miss.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use kolstat_api::{run_transient, ApiError, RetryPolicy, SolarClient};
use kolstat_core::fields::{Business, FieldSelection};
use kolstat_core::CancelToken;

use crate::accounts::{CredentialPool, Lease};
use crate::aggregate::{merge, ResultRecord};
use crate::flatten;

/// Everything a worker needs to process jobs. Shared across worker loops.
pub struct CollectContext {
    pub client: SolarClient,
    pub pool: Arc<CredentialPool>,
    pub policy: RetryPolicy,
    pub cancel: CancelToken,
    pub selection: FieldSelection,
    pub throttle: Duration,
    pub max_uses_per_day: u32,
}

/// A completed job's payload.
#[derive(Debug)]
pub struct JobSuccess {
    pub record: ResultRecord,
    pub failure_notes: Vec<String>,
}

/// Ways a job fails outright. Quota exhaustion is terminal for the whole
/// run, not just the job; the orchestrator treats it accordingly.
#[derive(Debug, Error)]
pub enum JobFailure {
    #[error("all credentials exhausted for today")]
    QuotaExhausted,

    #[error("identity fetch failed: {0}")]
    Mandatory(#[source] ApiError),

    #[error("identity data unavailable after all attempts")]
    MandatoryUnavailable,
}

/// Outcome of one optional fetch group: the fields it produced and a note
/// per sub-fetch that came back empty or errored.
#[derive(Debug, Default)]
struct SubOutcome {
    record: ResultRecord,
    notes: Vec<String>,
    auth_rejected: bool,
}

impl SubOutcome {
    fn absorb(&mut self, label: &str, result: Result<Option<ResultRecord>, ApiError>) {
        match result {
            Ok(Some(fields)) => {
                // Group-internal namespaces are disjoint; a collision here is
                // the same configuration bug merge() reports upstream.
                let collisions = merge(&mut self.record, fields);
                for key in collisions {
                    tracing::error!(field = %key, %label, "duplicate field within one fetch group");
                }
            }
            Ok(None) => {
                self.notes.push(format!("{label}: no data after retries"));
            }
            Err(err) => {
                if err.is_auth_rejected() {
                    self.auth_rejected = true;
                }
                self.notes.push(format!("{label}: {err}"));
            }
        }
    }
}

/// Runs one job against one leased credential.
///
/// # Errors
///
/// [`JobFailure`] when no credential is available or the mandatory identity
/// fetch does not produce data. Optional-fetch failures are not errors; they
/// surface as `failure_notes` on the success value.
pub async fn process_one(ctx: &CollectContext, identity_id: &str) -> Result<JobSuccess, JobFailure> {
    let Some(lease) = ctx.pool.acquire(ctx.max_uses_per_day) else {
        return Err(JobFailure::QuotaExhausted);
    };
    tracing::debug!(identity = identity_id, account = %lease.account_id, "credential leased");

    let info = match run_transient(ctx.policy, &ctx.cancel, || {
        ctx.client.blogger_info(identity_id, &lease.cookie)
    })
    .await
    {
        Ok(Some(info)) => info,
        Ok(None) => return Err(JobFailure::MandatoryUnavailable),
        Err(err) => {
            if err.is_auth_rejected() {
                ctx.pool.mark_invalid(lease.index);
            }
            return Err(JobFailure::Mandatory(err));
        }
    };

    let mut record = flatten::flatten_blogger(&info);
    let mut notes = Vec::new();

    let (summaries, perf, fans, profile) = tokio::join!(
        fetch_summaries(ctx, identity_id, &lease),
        fetch_performance(ctx, identity_id, &lease),
        fetch_fans_summary(ctx, identity_id, &lease),
        fetch_fans_profile(ctx, identity_id, &lease),
    );

    let mut auth_rejected = false;
    for outcome in [summaries, perf, fans, profile] {
        auth_rejected |= outcome.auth_rejected;
        let collisions = merge(&mut record, outcome.record);
        for key in collisions {
            tracing::error!(field = %key, identity = identity_id, "field collision between fetch groups");
            notes.push(format!("field collision: {key}"));
        }
        notes.extend(outcome.notes);
    }

    if auth_rejected {
        ctx.pool.mark_invalid(lease.index);
    }

    Ok(JobSuccess {
        record,
        failure_notes: notes,
    })
}

/// Aggregate note metrics for both business views, sequential within.
async fn fetch_summaries(ctx: &CollectContext, identity_id: &str, lease: &Lease) -> SubOutcome {
    let mut outcome = SubOutcome::default();
    for business in [Business::Daily, Business::Coop] {
        let result = run_transient(ctx.policy, &ctx.cancel, || {
            ctx.client
                .data_summary(identity_id, business.flag(), &lease.cookie)
        })
        .await;
        outcome.absorb(
            &format!("data_summary[{}]", business.key()),
            result.map(|opt| opt.map(|s| flatten::flatten_summary(business, &s))),
        );
    }
    outcome
}

/// Selected performance variants, sequential and throttled within; each
/// variant is a notes-rate fetch followed by a core-data fetch.
async fn fetch_performance(ctx: &CollectContext, identity_id: &str, lease: &Lease) -> SubOutcome {
    let mut outcome = SubOutcome::default();
    let mut first = true;
    for variant in ctx.selection.iter() {
        if ctx.cancel.is_stopped() {
            break;
        }
        if !first {
            tokio::time::sleep(ctx.throttle).await;
        }
        first = false;

        let rate = run_transient(ctx.policy, &ctx.cancel, || {
            ctx.client
                .notes_rate(identity_id, variant.params(), &lease.cookie)
        })
        .await;
        outcome.absorb(
            &format!("notes_rate[{}]", variant.label()),
            rate.map(|opt| opt.map(|r| flatten::flatten_notes_rate(variant, &r))),
        );

        tokio::time::sleep(ctx.throttle).await;

        let core = run_transient(ctx.policy, &ctx.cancel, || {
            ctx.client
                .core_data(identity_id, variant.params(), &lease.cookie)
        })
        .await;
        outcome.absorb(
            &format!("core_data[{}]", variant.label()),
            core.map(|opt| opt.map(|c| flatten::flatten_core_data(variant, &c))),
        );
    }
    outcome
}

async fn fetch_fans_summary(ctx: &CollectContext, identity_id: &str, lease: &Lease) -> SubOutcome {
    let mut outcome = SubOutcome::default();
    let result = run_transient(ctx.policy, &ctx.cancel, || {
        ctx.client.fans_summary(identity_id, &lease.cookie)
    })
    .await;
    outcome.absorb(
        "fans_summary",
        result.map(|opt| opt.map(|f| flatten::flatten_fans_summary(&f))),
    );
    outcome
}

async fn fetch_fans_profile(ctx: &CollectContext, identity_id: &str, lease: &Lease) -> SubOutcome {
    let mut outcome = SubOutcome::default();
    let result = run_transient(ctx.policy, &ctx.cancel, || {
        ctx.client.fans_profile(identity_id, &lease.cookie)
    })
    .await;
    outcome.absorb(
        "fans_profile",
        result.map(|opt| opt.map(|p| flatten::flatten_fans_profile(&p))),
    );
    outcome
}
