use std::fmt;
use derive_more::Display;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// The kinds of user the application knows about. Superusers get a longer password lifetime,
/// including a grace period when their account is first created.
///
#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq, Eq)]
pub enum UserType {
    Standard,
    Superuser,
}

impl Default for UserType {
    fn default() -> Self {
        UserType::Standard
    }
}

///
/// The credential-bearing record persisted by an `AccountStore`.
///
/// Every operation in this crate takes an Account snapshot and returns a new one - nothing here
/// writes it back. `version` is owned by the store and bumped on every successful write.
///
#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct Account {
    pub account_id: String,
    pub email: String,
    pub user_type: UserType,
    pub password_hash: String,
    pub is_locked: bool,
    pub failed_login_attempts: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub login_attempts_reset_date: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub password_expiration_date: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Account {
    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }
}

// The hash must never end up in a log line.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("user_type", &self.user_type)
            .field("password_hash", &"<redacted>")
            .field("is_locked", &self.is_locked)
            .field("failed_login_attempts", &self.failed_login_attempts)
            .field("login_attempts_reset_date", &self.login_attempts_reset_date)
            .field("password_expiration_date", &self.password_expiration_date)
            .field("version", &self.version)
            .finish()
    }
}

///
/// What a successful authentication hands back to the caller. Carries no secret material.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Principal {
    pub account_id: String,
    pub email: String,
    pub user_type: UserType,
    pub must_change_password: bool,
}

impl Principal {
    pub fn new(account: &Account, must_change_password: bool) -> Self {
        Principal {
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            user_type: account.user_type,
            must_change_password,
        }
    }
}

///
/// The parts of an account callers outside the crate may see.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AccountView {
    pub account_id: String,
    pub email: String,
    pub user_type: UserType,
    pub is_locked: bool,
    pub failed_login_attempts: u32,
    pub password_expiration_date: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        AccountView {
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            user_type: account.user_type,
            is_locked: account.is_locked,
            failed_login_attempts: account.failed_login_attempts,
            password_expiration_date: account.password_expiration_date,
        }
    }
}

///
/// Emails are the login identifier, compared case-insensitively.
///
pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}
