pub mod client;
pub mod cookie;
pub mod endpoints;
pub mod error;
pub mod retry;
pub mod sign;
pub mod types;

pub use client::SolarClient;
pub use error::ApiError;
pub use retry::{run_transient, RetryPolicy};
pub use sign::{sign_request, SignatureTriplet};
