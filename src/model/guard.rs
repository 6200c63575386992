use chrono::{DateTime, Duration, Utc};
use super::{account::Account, policy::PasswordPolicy};

///
/// The lockout rules: how many failures are tolerated and how long they are remembered for.
///
#[derive(Clone, Debug, PartialEq)]
pub struct GuardPolicy {
    pub max_failed_attempts: u32,
    pub failure_window: Duration,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        GuardPolicy {
            max_failed_attempts: 5,
            failure_window: Duration::days(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AccountState {
    UnlockedOk,
    UnlockedAtLimit,
    Locked,
}

///
/// The result of one authentication attempt. Failures are expected and frequent so they are
/// values, not errors.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    Success { password_expired: bool },

    /// The account was already locked - the secret was never checked.
    RejectedLocked,

    RejectedBadSecret { attempts_remaining: u32 },

    /// This attempt was the one that exhausted the allowance.
    RejectedLockedJustNow,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

///
/// Whether the account returned alongside an outcome differs from the one supplied.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Persist {
    Required,
    NotRequired,
}

#[derive(Clone, Debug)]
pub struct Authentication {
    pub outcome: Outcome,
    pub account: Account,
    pub persist: Persist,
}

impl GuardPolicy {
    pub fn state(&self, account: &Account) -> AccountState {
        if account.is_locked {
            AccountState::Locked
        } else if account.failed_login_attempts >= self.max_failed_attempts {
            AccountState::UnlockedAtLimit
        } else {
            AccountState::UnlockedOk
        }
    }

    ///
    /// Decide one authentication attempt against the account snapshot.
    ///
    /// Anything other than a positive verification - including an account with no hash or an
    /// unreadable hash - counts as a bad secret.
    ///
    pub fn authenticate(&self, account: &Account, supplied_secret: &str, now: DateTime<Utc>, passwords: &PasswordPolicy) -> Authentication {
        if account.is_locked {
            return Authentication {
                outcome: Outcome::RejectedLocked,
                account: account.clone(),
                persist: Persist::NotRequired,
            }
        }

        let verified = account.has_password() && match passwords.verify_secret(supplied_secret, &account.password_hash) {
            Ok(verified) => verified,
            Err(err) => {
                tracing::warn!("Account {} has an unreadable password hash: {}", account.account_id, err.message());
                false
            }
        };

        if verified {
            let mut account = account.clone();
            account.failed_login_attempts = 0;

            return Authentication {
                outcome: Outcome::Success { password_expired: passwords.is_expired(&account, now) },
                account,
                persist: Persist::Required,
            }
        }

        let account = self.record_failure(account, now);
        let outcome = match account.is_locked {
            true  => Outcome::RejectedLockedJustNow,
            false => Outcome::RejectedBadSecret {
                attempts_remaining: self.max_failed_attempts.saturating_sub(account.failed_login_attempts)
            },
        };

        Authentication { outcome, account, persist: Persist::Required }
    }

    ///
    /// Apply a failed attempt to the failure window. The four checks run in order on every
    /// failure and more than one of them can fire.
    ///
    pub fn record_failure(&self, account: &Account, now: DateTime<Utc>) -> Account {
        let mut account = account.clone();
        let max = self.max_failed_attempts;

        // Stale failures from an expired window are forgiven.
        if now >= account.login_attempts_reset_date && account.failed_login_attempts < max {
            account.failed_login_attempts = 0;
        }

        if account.failed_login_attempts == 0 {
            account.login_attempts_reset_date = now + self.failure_window;
        }

        if now < account.login_attempts_reset_date && account.failed_login_attempts < max {
            account.failed_login_attempts += 1;
        }

        if account.failed_login_attempts >= max {
            account.is_locked = true;
        }

        account
    }

    ///
    /// Administrative unlock. No secret is checked.
    ///
    pub fn unlock(&self, account: &Account, now: DateTime<Utc>) -> Account {
        let mut account = account.clone();
        account.is_locked = false;
        account.failed_login_attempts = 0;
        account.login_attempts_reset_date = now;
        account
    }
}
