//! Quota-tracked credential pool with round-robin rotation.
//!
//! Accounts are opaque session-cookie credentials captured outside the core.
//! Workers borrow them through [`CredentialPool::acquire`]; usage is
//! fire-and-increment, there is no check-in. The scan, the usage increment
//! and the cursor advance all happen inside one critical section, which is
//! what guarantees no two concurrent workers can consume the same usage slot.

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Invalid,
}

/// One platform credential: an opaque cookie string plus quota bookkeeping.
/// `daily_use_count` is only ever mutated under the pool's lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cookie: String,
    #[serde(default = "default_status")]
    pub status: AccountStatus,
    #[serde(default)]
    pub last_use_date: Option<NaiveDate>,
    #[serde(default)]
    pub daily_use_count: u32,
}

fn default_status() -> AccountStatus {
    AccountStatus::Active
}

/// One granted usage slot. Holding a lease implies the usage count was
/// already incremented; dropping it returns nothing to the pool.
#[derive(Debug, Clone)]
pub struct Lease {
    pub index: usize,
    pub account_id: String,
    pub cookie: String,
}

struct PoolState {
    accounts: Vec<Account>,
    cursor: usize,
}

/// Shared, mutex-guarded credential rotation state.
pub struct CredentialPool {
    inner: Mutex<PoolState>,
}

impl CredentialPool {
    #[must_use]
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            inner: Mutex::new(PoolState {
                accounts,
                cursor: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // A poisoned lock only means another worker panicked mid-bookkeeping;
        // the counters themselves are always valid integers.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Acquires the next eligible credential for today, or `None` when a
    /// full rotation finds every credential invalid or at its daily cap.
    #[must_use]
    pub fn acquire(&self, max_per_day: u32) -> Option<Lease> {
        self.acquire_on(max_per_day, chrono::Local::now().date_naive())
    }

    /// Same as [`CredentialPool::acquire`] with an explicit calendar day, so
    /// day-rollover behaviour is testable.
    #[must_use]
    pub fn acquire_on(&self, max_per_day: u32, today: NaiveDate) -> Option<Lease> {
        let mut state = self.lock();
        let len = state.accounts.len();
        if len == 0 {
            return None;
        }

        for _ in 0..len {
            let idx = state.cursor % len;
            let account = &mut state.accounts[idx];

            // First touch of a new calendar day resets the quota window.
            if account.last_use_date != Some(today) {
                account.last_use_date = Some(today);
                account.daily_use_count = 0;
            }

            if account.status == AccountStatus::Active && account.daily_use_count < max_per_day {
                account.daily_use_count += 1;
                let lease = Lease {
                    index: idx,
                    account_id: account.id.clone(),
                    cookie: account.cookie.clone(),
                };
                // Advance past the hit so the next acquire starts at the
                // following credential; under concurrency this prevents
                // head-of-line concentration on one account.
                state.cursor = (idx + 1) % len;
                return Some(lease);
            }

            state.cursor = (idx + 1) % len;
        }

        None
    }

    /// Excludes a credential from future rotation after an auth rejection.
    pub fn mark_invalid(&self, index: usize) {
        let mut state = self.lock();
        if let Some(account) = state.accounts.get_mut(index) {
            tracing::warn!(account = %account.id, "credential rejected by platform — removing from rotation");
            account.status = AccountStatus::Invalid;
        }
    }

    /// Copy of the current account bookkeeping, for persistence and reporting.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Account> {
        self.lock().accounts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn seven_acquires_over_three_accounts_with_cap_two() {
        let pool = CredentialPool::new(vec![account("c1"), account("c2"), account("c3")]);
        let today = day("2026-08-29");

        let order: Vec<String> = (0..6)
            .map(|_| pool.acquire_on(2, today).unwrap().account_id)
            .collect();
        assert_eq!(order, vec!["c1", "c2", "c3", "c1", "c2", "c3"]);

        // 3 accounts × 2 uses = 6 slots; the seventh acquire is exhausted.
        assert!(pool.acquire_on(2, today).is_none());
    }

    #[test]
    fn rotation_resumes_from_cursor_position() {
        let pool = CredentialPool::new(vec![account("c1"), account("c2"), account("c3")]);
        let today = day("2026-08-29");

        assert_eq!(pool.acquire_on(10, today).unwrap().account_id, "c1");
        assert_eq!(pool.acquire_on(10, today).unwrap().account_id, "c2");
        // Next acquire continues at c3, not back at c1.
        assert_eq!(pool.acquire_on(10, today).unwrap().account_id, "c3");
        assert_eq!(pool.acquire_on(10, today).unwrap().account_id, "c1");
    }

    #[test]
    fn day_rollover_resets_usage_once() {
        let pool = CredentialPool::new(vec![account("c1")]);
        let monday = day("2026-08-24");
        let tuesday = day("2026-08-25");

        assert!(pool.acquire_on(1, monday).is_some());
        assert!(pool.acquire_on(1, monday).is_none());

        // New day: the cap opens up again, exactly once.
        assert!(pool.acquire_on(1, tuesday).is_some());
        assert!(pool.acquire_on(1, tuesday).is_none());

        let snapshot = pool.snapshot();
        assert_eq!(snapshot[0].last_use_date, Some(tuesday));
        assert_eq!(snapshot[0].daily_use_count, 1);
    }

    #[test]
    fn invalid_accounts_are_skipped() {
        let pool = CredentialPool::new(vec![account("c1"), account("c2")]);
        let today = day("2026-08-29");
        pool.mark_invalid(0);

        assert_eq!(pool.acquire_on(5, today).unwrap().account_id, "c2");
        assert_eq!(pool.acquire_on(5, today).unwrap().account_id, "c2");
        assert_eq!(pool.snapshot()[0].daily_use_count, 0);
    }

    #[test]
    fn empty_pool_is_always_exhausted() {
        let pool = CredentialPool::new(Vec::new());
        assert!(pool.acquire_on(5, day("2026-08-29")).is_none());
    }

    #[test]
    fn zero_cap_is_always_exhausted() {
        let pool = CredentialPool::new(vec![account("c1")]);
        assert!(pool.acquire_on(0, day("2026-08-29")).is_none());
    }

    #[test]
    fn concurrent_acquires_never_exceed_quota() {
        use std::sync::Arc;

        let pool = Arc::new(CredentialPool::new(vec![
            account("c1"),
            account("c2"),
            account("c3"),
        ]));
        let today = day("2026-08-29");
        let max_per_day = 4;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let mut granted = 0u32;
                    for _ in 0..10 {
                        if pool.acquire_on(max_per_day, today).is_some() {
                            granted += 1;
                        }
                    }
                    granted
                })
            })
            .collect();

        let granted: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // 3 accounts × 4 slots: exactly 12 grants no matter the interleaving.
        assert_eq!(granted, 12);
        for acc in pool.snapshot() {
            assert!(acc.daily_use_count <= max_per_day);
            assert_eq!(acc.daily_use_count, max_per_day);
        }
    }
}
