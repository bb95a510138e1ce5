//! Entitlement gate checked before any collection run.
//!
//! The gate is an interface; how a deployment decides entitlement (license
//! server, config flag, nothing at all) is out of scope here.

/// Verdict of an entitlement check.
#[derive(Debug, Clone)]
pub struct LicenseDecision {
    pub allowed: bool,
    pub tier: Option<String>,
}

pub trait LicenseGate: Send + Sync {
    fn check_allowed(&self) -> LicenseDecision;
}

/// Always-allowed gate for self-hosted use.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unrestricted;

impl LicenseGate for Unrestricted {
    fn check_allowed(&self) -> LicenseDecision {
        LicenseDecision {
            allowed: true,
            tier: None,
        }
    }
}
