//! Password hashes and lockout state for the two auth realms.
//!
//! These never leave the auth service: they are loaded separately from the
//! public `Customer`/`User` records, so a serialized record cannot leak them.

use chrono::{DateTime, TimeDelta, Utc};

/// Stored login secret and lockout counters for one account.
#[derive(Clone)]
pub struct Credentials {
    /// Argon2id PHC string.
    pub password_hash: String,
    pub login: LoginState,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("password_hash", &"[REDACTED]")
            .field("login", &self.login)
            .finish()
    }
}

/// Consecutive failed logins and the lock they triggered, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginState {
    pub attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
}

impl LoginState {
    /// True while a lock is in force.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// State after one more failed attempt.
    ///
    /// An expired lock restarts the count. Reaching `max_attempts` locks the
    /// account until `now + lock_time`.
    #[must_use]
    pub fn after_failure(self, now: DateTime<Utc>, max_attempts: u32, lock_time: TimeDelta) -> Self {
        let expired = self.lock_until.is_some_and(|until| until <= now);
        let attempts = if expired { 1 } else { self.attempts.saturating_add(1) };
        let max = i32::try_from(max_attempts).unwrap_or(i32::MAX);

        if attempts >= max {
            Self {
                attempts,
                lock_until: Some(now + lock_time),
            }
        } else {
            Self {
                attempts,
                lock_until: None,
            }
        }
    }
}
