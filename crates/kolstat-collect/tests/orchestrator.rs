//! End-to-end orchestration tests against a mocked platform.

use std::sync::Arc;
use std::time::Duration;

use kolstat_api::{RetryPolicy, SolarClient};
use kolstat_collect::{
    Account, AccountStatus, CollectContext, CollectError, CollectionJob, CredentialPool, JobStatus,
    LicenseDecision, LicenseGate, Orchestrator, Unrestricted,
};
use kolstat_core::fields::FieldSelection;
use kolstat_core::CancelToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account(id: &str) -> Account {
    Account {
        id: id.to_string(),
        name: String::new(),
        cookie: format!("a1=token-{id}; webId=abcdef0123456789"),
        status: AccountStatus::Active,
        last_use_date: None,
        daily_use_count: 0,
    }
}

fn context(server: &MockServer, accounts: Vec<Account>, max_uses_per_day: u32) -> Arc<CollectContext> {
    context_with_throttle(server, accounts, max_uses_per_day, Duration::ZERO)
}

fn context_with_throttle(
    server: &MockServer,
    accounts: Vec<Account>,
    max_uses_per_day: u32,
    throttle: Duration,
) -> Arc<CollectContext> {
    let client = SolarClient::new(&server.uri(), 10, "test-agent", "http://example.com/")
        .expect("client construction should not fail");
    Arc::new(CollectContext {
        client,
        pool: Arc::new(CredentialPool::new(accounts)),
        policy: RetryPolicy::new(2, 0),
        cancel: CancelToken::new(),
        // Performance variants are exercised separately; keeping the
        // selection empty keeps the mock surface small here.
        selection: FieldSelection::none(),
        throttle,
        max_uses_per_day,
    })
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "success": true,
        "code": 0,
        "data": data,
    }))
}

fn blogger_payload(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "redId": "900001",
        "fansCount": 1000,
    })
}

async fn mount_blogger(server: &MockServer, user_id: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/solar/cooperator/user/blogger/{user_id}")))
        .respond_with(ok(blogger_payload(name)))
        .mount(server)
        .await;
}

async fn mount_optional_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/pgy/kol/data/data_summary"))
        .respond_with(ok(serde_json::json!({ "noteNumber": 5 })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/solar/kol/data_v3/fans_summary"))
        .respond_with(ok(serde_json::json!({ "fansGrowthRate": 0.05 })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/solar/kol/data/u1/fans_profile"))
        .respond_with(ok(serde_json::json!({
            "gender": { "male": 0.4, "female": 0.6 }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn optional_failure_still_completes_with_note() {
    let server = MockServer::start().await;
    mount_blogger(&server, "u1", "Creator One").await;

    Mock::given(method("GET"))
        .and(path("/api/pgy/kol/data/data_summary"))
        .respond_with(ok(serde_json::json!({ "noteNumber": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/solar/kol/data/u1/fans_profile"))
        .respond_with(ok(serde_json::json!({
            "gender": { "male": 0.4, "female": 0.6 }
        })))
        .mount(&server)
        .await;
    // Follower rates are down; everything else answers.
    Mock::given(method("GET"))
        .and(path("/api/solar/kol/data_v3/fans_summary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctx = context(&server, vec![account("c1")], 100);
    let outcome = Orchestrator::new(1)
        .run(ctx, &Unrestricted, vec![CollectionJob::new("u1")])
        .await
        .expect("run should succeed");

    let job = &outcome.jobs[0];
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.failure_notes.len(), 1);
    assert!(job.failure_notes[0].starts_with("fans_summary:"));
    assert_eq!(job.record["blogger.name"], "Creator One");
    assert_eq!(job.record["summary.daily.note_number"], "5");
    assert_eq!(job.record["profile.gender"], "male 40.00%, female 60.00%");
    // The failed namespace is absent, not empty-stringed.
    assert!(job.record.keys().all(|k| !k.starts_with("fans.")));
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn mandatory_failure_fails_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/solar/cooperator/user/blogger/u1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctx = context(&server, vec![account("c1")], 100);
    let outcome = Orchestrator::new(1)
        .run(ctx, &Unrestricted, vec![CollectionJob::new("u1")])
        .await
        .expect("run should succeed");

    let job = &outcome.jobs[0];
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().starts_with("identity fetch failed"));
    assert!(job.record.is_empty());
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.summary.completed, 0);
}

#[tokio::test]
async fn auth_rejection_invalidates_the_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/solar/cooperator/user/blogger/u1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let ctx = context(&server, vec![account("c1")], 100);
    let pool = Arc::clone(&ctx.pool);
    let outcome = Orchestrator::new(1)
        .run(ctx, &Unrestricted, vec![CollectionJob::new("u1")])
        .await
        .expect("run should succeed");

    assert_eq!(outcome.jobs[0].status, JobStatus::Failed);
    assert_eq!(outcome.summary.invalidated_accounts, vec!["c1"]);
    assert_eq!(pool.snapshot()[0].status, AccountStatus::Invalid);
}

#[tokio::test]
async fn quota_exhaustion_ends_the_run() {
    let server = MockServer::start().await;
    mount_blogger(&server, "u1", "Creator One").await;
    mount_blogger(&server, "u2", "Creator Two").await;
    mount_optional_ok(&server).await;

    // One credential, one use: the second job cannot lease anything.
    let ctx = context(&server, vec![account("c1")], 1);
    let jobs = vec![CollectionJob::new("u1"), CollectionJob::new("u2")];
    let outcome = Orchestrator::new(1)
        .run(ctx, &Unrestricted, jobs)
        .await
        .expect("run should succeed");

    assert!(outcome.summary.quota_exhausted);
    assert_eq!(outcome.summary.completed, 1);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.jobs[1].status, JobStatus::Failed);
    assert!(outcome.jobs[1]
        .error
        .as_deref()
        .unwrap()
        .contains("exhausted"));
}

#[tokio::test]
async fn concurrency_level_does_not_change_outcomes() {
    let ids = ["u1", "u2", "u3", "u4"];

    async fn run_at(concurrency: usize, ids: &[&str]) -> (Vec<JobStatus>, Vec<u32>) {
        let server = MockServer::start().await;
        for id in ids {
            Mock::given(method("GET"))
                .and(path(format!("/api/solar/cooperator/user/blogger/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "success": true,
                    "code": 0,
                    "data": { "name": format!("creator-{id}"), "fansCount": 1 },
                })))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path(format!("/api/solar/kol/data/{id}/fans_profile")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "success": true,
                    "code": 0,
                    "data": { "gender": { "male": 0.5, "female": 0.5 } },
                })))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/api/pgy/kol/data/data_summary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "code": 0, "data": { "noteNumber": 1 },
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/solar/kol/data_v3/fans_summary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "code": 0, "data": {},
            })))
            .mount(&server)
            .await;

        let ctx = context(
            &server,
            vec![account("c1"), account("c2"), account("c3")],
            100,
        );
        let pool = Arc::clone(&ctx.pool);
        let jobs: Vec<CollectionJob> = ids.iter().map(|id| CollectionJob::new(*id)).collect();
        let outcome = Orchestrator::new(concurrency)
            .run(ctx, &Unrestricted, jobs)
            .await
            .expect("run should succeed");

        let statuses = outcome.jobs.iter().map(|j| j.status).collect();
        let mut usage: Vec<u32> = pool.snapshot().iter().map(|a| a.daily_use_count).collect();
        usage.sort_unstable();
        (statuses, usage)
    }

    let (statuses_1, usage_1) = run_at(1, &ids).await;
    let (statuses_8, usage_8) = run_at(8, &ids).await;

    assert!(statuses_1.iter().all(|s| *s == JobStatus::Completed));
    assert_eq!(statuses_1, statuses_8);
    // Round-robin allocation gives the same usage multiset regardless of
    // worker interleaving: four leases over three credentials.
    assert_eq!(usage_1, vec![1, 1, 2]);
    assert_eq!(usage_1, usage_8);
}

#[tokio::test]
async fn pause_holds_claims_until_resume() {
    let server = MockServer::start().await;
    mount_blogger(&server, "u1", "Creator One").await;
    mount_blogger(&server, "u2", "Creator Two").await;
    mount_optional_ok(&server).await;

    let ctx = context(&server, vec![account("c1")], 100);
    let cancel = ctx.cancel.clone();
    cancel.pause();

    let jobs = vec![CollectionJob::new("u1"), CollectionJob::new("u2")];
    let handle = tokio::spawn(async move {
        Orchestrator::new(1).run(ctx, &Unrestricted, jobs).await
    });

    // Well past several pause-poll intervals: nothing may be claimed and no
    // request may leave while the pause flag is up.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!handle.is_finished());
    assert!(server.received_requests().await.unwrap().is_empty());

    cancel.resume();
    let outcome = handle
        .await
        .expect("run task should not panic")
        .expect("run should succeed");
    assert!(outcome
        .jobs
        .iter()
        .all(|j| j.status == JobStatus::Completed));
    assert_eq!(outcome.summary.completed, 2);
}

#[tokio::test]
async fn stop_mid_job_discards_the_in_flight_result() {
    let server = MockServer::start().await;
    // The identity fetch answers successfully but slowly, so stop can be
    // raised while the job is in flight.
    Mock::given(method("GET"))
        .and(path("/api/solar/cooperator/user/blogger/u1"))
        .respond_with(
            ok(blogger_payload("Creator One")).set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let ctx = context(&server, vec![account("c1")], 100);
    let cancel = ctx.cancel.clone();
    let handle = tokio::spawn(async move {
        Orchestrator::new(1)
            .run(ctx, &Unrestricted, vec![CollectionJob::new("u1")])
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.stop();

    let outcome = handle
        .await
        .expect("run task should not panic")
        .expect("run should succeed");
    // The job's result was produced after stop and discarded: no terminal
    // state, no record, no completion stamp.
    assert_eq!(outcome.jobs[0].status, JobStatus::InProgress);
    assert!(outcome.jobs[0].record.is_empty());
    assert!(outcome.jobs[0].completed_at.is_none());
    assert_eq!(outcome.summary.completed, 0);
    assert_eq!(outcome.summary.failed, 0);
}

#[tokio::test]
async fn throttle_does_not_trail_the_final_job() {
    let server = MockServer::start().await;
    mount_blogger(&server, "u1", "Creator One").await;
    mount_optional_ok(&server).await;

    let ctx = context_with_throttle(
        &server,
        vec![account("c1")],
        100,
        Duration::from_secs(2),
    );
    let started = std::time::Instant::now();
    let outcome = Orchestrator::new(1)
        .run(ctx, &Unrestricted, vec![CollectionJob::new("u1")])
        .await
        .expect("run should succeed");

    assert_eq!(outcome.summary.completed, 1);
    // A single job has no successor, so the inter-job throttle must not run.
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "run trailed into the throttle: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn stop_before_run_leaves_jobs_pending() {
    let server = MockServer::start().await;
    let ctx = context(&server, vec![account("c1")], 100);
    ctx.cancel.stop();

    let outcome = Orchestrator::new(2)
        .run(ctx, &Unrestricted, vec![CollectionJob::new("u1")])
        .await
        .expect("run should succeed");

    assert_eq!(outcome.jobs[0].status, JobStatus::Pending);
    assert!(server.received_requests().await.unwrap().is_empty());
}

struct Denied;

impl LicenseGate for Denied {
    fn check_allowed(&self) -> LicenseDecision {
        LicenseDecision {
            allowed: false,
            tier: Some("trial".to_string()),
        }
    }
}

#[tokio::test]
async fn license_denial_performs_no_network_activity() {
    let server = MockServer::start().await;
    let ctx = context(&server, vec![account("c1")], 100);

    let err = Orchestrator::new(2)
        .run(ctx, &Denied, vec![CollectionJob::new("u1")])
        .await
        .unwrap_err();

    assert!(
        matches!(err, CollectError::LicenseDenied { tier: Some(ref t) } if t == "trial"),
        "got: {err:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}
