//! Multi-account collection engine: credential rotation, per-creator jobs,
//! bounded-concurrency orchestration, and the persistence/export seams.

pub mod accounts;
pub mod aggregate;
pub mod error;
pub mod export;
pub mod flatten;
pub mod job;
pub mod license;
pub mod orchestrator;
pub mod store;
pub mod worker;

pub use accounts::{Account, AccountStatus, CredentialPool};
pub use aggregate::ResultRecord;
pub use error::CollectError;
pub use export::{export_table, ExportSink, JsonLinesSink};
pub use job::{CollectionJob, JobStatus};
pub use license::{LicenseDecision, LicenseGate, Unrestricted};
pub use orchestrator::{Orchestrator, RunOutcome, RunSummary};
pub use store::{JsonFileStore, PersistenceStore};
pub use worker::{CollectContext, JobFailure, JobSuccess};
