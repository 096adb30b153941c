//! Per-employee advisory locks over the store's compare-and-set primitive.
//!
//! Debit and certification serialize on these. A lock document carries its
//! owner token and a deadline; a holder that outlives its deadline can be
//! taken over by the next acquirer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::store::{Document, Value};
use crate::database::{collections, Store};
use crate::error::{AppError, AppResult};

const ACQUIRE_ATTEMPTS: u32 = 20;
const RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Clone)]
pub struct LockService {
    store: Store,
}

/// A held advisory lock. Must be released explicitly; an unreleased guard
/// simply ages out at its deadline.
pub struct LockGuard {
    store: Store,
    key: String,
    owner: String,
}

impl LockService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Acquires `scope:employee_id`, retrying briefly on contention and
    /// taking over stale holders past their deadline.
    pub async fn acquire(
        &self,
        scope: &str,
        employee_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<LockGuard> {
        let key = format!("{scope}:{employee_id}");
        let owner = Uuid::new_v4().to_string();

        for _ in 0..ACQUIRE_ATTEMPTS {
            let deadline = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(30));
            let claim = Document::new(key.clone())
                .with("owner", owner.as_str())
                .with("deadline", deadline);

            // Absent document: free.
            if self
                .store
                .check_and_set(collections::LOCKS, &key, "owner", None, claim.clone())
                .await?
            {
                return Ok(self.guard(&key, &owner));
            }

            let current = self.store.get(collections::LOCKS, &key).await?;
            let (held_by, held_until) = match &current {
                Some(doc) => (
                    doc.get("owner").cloned().unwrap_or(Value::Null),
                    doc.timestamp(collections::LOCKS, "deadline").ok(),
                ),
                None => (Value::Null, None),
            };

            // Released document: owner was nulled out.
            if held_by.is_null() {
                if self
                    .store
                    .check_and_set(
                        collections::LOCKS,
                        &key,
                        "owner",
                        Some(Value::Null),
                        claim.clone(),
                    )
                    .await?
                {
                    return Ok(self.guard(&key, &owner));
                }
                continue;
            }

            // Stale holder: deadline passed, take over.
            if held_until.is_some_and(|until| until < now) {
                if self
                    .store
                    .check_and_set(
                        collections::LOCKS,
                        &key,
                        "owner",
                        Some(held_by.clone()),
                        claim,
                    )
                    .await?
                {
                    log::warn!("took over stale lock {key} from expired holder");
                    return Ok(self.guard(&key, &owner));
                }
                continue;
            }

            tokio::time::sleep(RETRY_DELAY).await;
        }

        Err(AppError::StoreUnavailable(format!(
            "could not acquire lock {key}; another writer holds it"
        )))
    }

    fn guard(&self, key: &str, owner: &str) -> LockGuard {
        LockGuard {
            store: self.store.clone(),
            key: key.to_string(),
            owner: owner.to_string(),
        }
    }
}

impl LockGuard {
    /// Releases by nulling the owner, guarded on still holding the lock so a
    /// taken-over guard cannot free somebody else's claim.
    pub async fn release(self) -> AppResult<()> {
        let freed = Document::new(self.key.clone())
            .with("owner", Value::Null)
            .with("deadline", Value::Null);
        let released = self
            .store
            .check_and_set(
                collections::LOCKS,
                &self.key,
                "owner",
                Some(Value::Str(self.owner.clone())),
                freed,
            )
            .await?;
        if !released {
            log::warn!("lock {} was already taken over at release", self.key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LockService {
        LockService::new(Store::in_memory())
    }

    #[tokio::test]
    async fn second_acquirer_waits_out_a_held_lock() {
        let locks = service();
        let now = Utc::now();
        let guard = locks
            .acquire("debit", "E1", Duration::from_secs(60), now)
            .await
            .unwrap();

        let contender = locks
            .acquire("debit", "E1", Duration::from_millis(60), now)
            .await;
        assert!(matches!(contender, Err(AppError::StoreUnavailable(_))));

        guard.release().await.unwrap();
        let after = locks
            .acquire("debit", "E1", Duration::from_secs(60), now)
            .await;
        assert!(after.is_ok());
    }

    #[tokio::test]
    async fn stale_lock_is_taken_over() {
        let locks = service();
        let past = Utc::now() - chrono::Duration::minutes(10);
        let _stale = locks
            .acquire("certify", "E1", Duration::from_millis(1), past)
            .await
            .unwrap();

        let now = Utc::now();
        let fresh = locks
            .acquire("certify", "E1", Duration::from_secs(60), now)
            .await;
        assert!(fresh.is_ok());
    }

    #[tokio::test]
    async fn locks_are_scoped_per_employee() {
        let locks = service();
        let now = Utc::now();
        let _e1 = locks
            .acquire("debit", "E1", Duration::from_secs(60), now)
            .await
            .unwrap();
        let e2 = locks
            .acquire("debit", "E2", Duration::from_secs(60), now)
            .await;
        assert!(e2.is_ok());
    }
}
