use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::policy::TemporarySecret;

pub mod prelude {
    pub const TOPIC_ACCOUNT_LOCKED:            &str = "account.locked";
    pub const TOPIC_ACCOUNT_UNLOCKED:          &str = "account.unlocked";
    pub const TOPIC_PASSWORD_ROTATED:          &str = "account.password.rotated";
    pub const TOPIC_TEMPORARY_SECRET_ISSUED:   &str = "account.password.temporary";
}

///
/// A notification sent when the failed attempt allowance is exhausted and the account locks.
///
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct AccountLocked {
    pub account_id: String,
    pub locked_on: DateTime<Utc>,
}

///
/// A notification sent when an administrator unlocks an account.
///
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct AccountUnlocked {
    pub account_id: String,
}

///
/// A notification sent when a password has been changed by its owner.
///
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct PasswordRotated {
    pub account_id: String,
    pub expires_on: DateTime<Utc>,
}

///
/// Sent to the delivery subsystem, which emails the temporary password to the account holder.
/// This is the only place a plain text password ever leaves the crate.
///
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct TemporarySecretIssued {
    pub account_id: String,
    pub email: String,
    pub temporary_secret: TemporarySecret,
}

#[derive(Debug, PartialEq)]
pub enum CredentialEvent {
    AccountLocked(AccountLocked),
    AccountUnlocked(AccountUnlocked),
    PasswordRotated(PasswordRotated),
    TemporarySecretIssued(TemporarySecretIssued),
}

impl CredentialEvent {
    pub fn topic(&self) -> &'static str {
        use prelude::*;

        match self {
            CredentialEvent::AccountLocked(_)         => TOPIC_ACCOUNT_LOCKED,
            CredentialEvent::AccountUnlocked(_)       => TOPIC_ACCOUNT_UNLOCKED,
            CredentialEvent::PasswordRotated(_)       => TOPIC_PASSWORD_ROTATED,
            CredentialEvent::TemporarySecretIssued(_) => TOPIC_TEMPORARY_SECRET_ISSUED,
        }
    }

    pub fn account_id(&self) -> &str {
        match self {
            CredentialEvent::AccountLocked(event)         => &event.account_id,
            CredentialEvent::AccountUnlocked(event)       => &event.account_id,
            CredentialEvent::PasswordRotated(event)       => &event.account_id,
            CredentialEvent::TemporarySecretIssued(event) => &event.account_id,
        }
    }

    ///
    /// The JSON message body for the event's topic.
    ///
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            CredentialEvent::AccountLocked(event)         => serde_json::to_value(event),
            CredentialEvent::AccountUnlocked(event)       => serde_json::to_value(event),
            CredentialEvent::PasswordRotated(event)       => serde_json::to_value(event),
            CredentialEvent::TemporarySecretIssued(event) => serde_json::to_value(event),
        }
    }
}
