//! The `collect` command: load state, gate, run the orchestrator, persist
//! updated account usage, export records.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use kolstat_api::{RetryPolicy, SolarClient};
use kolstat_collect::{
    export_table, Account, CollectContext, CollectionJob, CredentialPool, ExportSink as _,
    JsonFileStore, JsonLinesSink, Orchestrator, PersistenceStore, Unrestricted,
};
use kolstat_core::{AppConfig, CancelToken, FieldSelection};

const ACCOUNTS_KEY: &str = "accounts";
const FIELDS_KEY: &str = "fields";

/// One creator id per line; blank lines and `#` comments are skipped.
fn load_targets(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading targets file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect())
}

fn load_accounts(store: &JsonFileStore) -> anyhow::Result<Vec<Account>> {
    match store.load(ACCOUNTS_KEY)? {
        Some(value) => Ok(serde_json::from_value(value).context("parsing stored accounts")?),
        None => Ok(Vec::new()),
    }
}

/// CLI override first, stored selection second, everything as the fallback.
fn load_selection(
    store: &JsonFileStore,
    override_labels: Option<&[String]>,
) -> anyhow::Result<FieldSelection> {
    if let Some(labels) = override_labels {
        return Ok(FieldSelection::from_labels(labels)?);
    }
    match store.load(FIELDS_KEY)? {
        Some(value) => {
            let labels: Vec<String> =
                serde_json::from_value(value).context("parsing stored field selection")?;
            Ok(FieldSelection::from_labels(&labels)?)
        }
        None => Ok(FieldSelection::all()),
    }
}

pub(crate) async fn run_collect(
    config: &AppConfig,
    targets_path: &Path,
    field_labels: Option<&[String]>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let targets = load_targets(targets_path)?;
    anyhow::ensure!(!targets.is_empty(), "targets file contains no creator ids");

    let store = JsonFileStore::new(&config.settings_path);
    let accounts_store = JsonFileStore::new(&config.accounts_path);
    let accounts = load_accounts(&accounts_store)?;
    anyhow::ensure!(
        !accounts.is_empty(),
        "no accounts configured — add credentials to {} first",
        config.accounts_path.display()
    );
    let selection = load_selection(&store, field_labels)?;

    if dry_run {
        println!(
            "dry-run: would collect {} creators with {} accounts, {} performance variants: [{}]",
            targets.len(),
            accounts.len(),
            selection.len(),
            selection.labels().join(", ")
        );
        return Ok(());
    }

    let client = SolarClient::new(
        &config.base_url,
        config.request_timeout_secs,
        &config.user_agent,
        &config.referer,
    )
    .context("building platform client")?;

    let pool = Arc::new(CredentialPool::new(accounts));
    let ctx = Arc::new(CollectContext {
        client,
        pool: Arc::clone(&pool),
        policy: RetryPolicy::new(config.retry_max_attempts, config.retry_delay_ms),
        cancel: CancelToken::new(),
        selection,
        throttle: Duration::from_millis(config.throttle_ms),
        max_uses_per_day: config.max_uses_per_day,
    });

    let jobs: Vec<CollectionJob> = targets.into_iter().map(CollectionJob::new).collect();
    let outcome = Orchestrator::new(config.concurrency)
        .run(ctx, &Unrestricted, jobs)
        .await?;

    // Usage counts and any invalidations survive into the next run.
    accounts_store.save(ACCOUNTS_KEY, serde_json::to_value(pool.snapshot())?)?;

    let (headers, rows) = export_table(&outcome.jobs);
    let mut sink = JsonLinesSink::new(&config.output_path);
    sink.write(&headers, &rows)?;

    println!(
        "completed {} / failed {} — results written to {}",
        outcome.summary.completed,
        outcome.summary.failed,
        config.output_path.display()
    );
    if outcome.summary.quota_exhausted {
        println!("run ended early: every account hit its daily quota");
    }
    for id in &outcome.summary.invalidated_accounts {
        println!("account '{id}' was rejected by the platform and marked invalid");
    }

    Ok(())
}
