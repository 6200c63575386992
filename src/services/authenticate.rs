use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::model::{account::{Account, Principal}, events::{AccountLocked, CredentialEvent}, guard::{Authentication, Outcome, Persist}};
use crate::utils::errors::{ErrorCode, GatekeeperError};
use super::{CredentialService, off_the_event_loop};

///
/// The answer to a login attempt. A rejection is an expected result, not an error.
///
#[derive(Clone, Debug, PartialEq)]
pub enum AuthResponse {
    Authenticated(Principal),
    Rejected(Rejection),
}

impl AuthResponse {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthResponse::Authenticated(_))
    }
}

///
/// Why a login was refused. The same shapes are used whether or not the email belongs to an
/// account.
///
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub enum Rejection {
    BadSecret { attempts_remaining: u32 },
    Locked,
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Rejection::BadSecret { attempts_remaining } => format!(
                "Invalid credentials. {} attempts left before this account is locked.",
                attempts_remaining),
            Rejection::Locked => String::from(
                "This account has been locked. Contact your administrator to unlock account."),
        }
    }
}

pub async fn authenticate(svc: &CredentialService, email: &str, plain_text_password: &str)
    -> Result<AuthResponse, GatekeeperError> {

    let now = svc.now();

    let account = match svc.store().find_by_email(email).await {
        Ok(account) => account,
        Err(err) if err.error_code() == ErrorCode::AccountNotFound => {
            return unknown_account(svc, email, plain_text_password, now).await
        },
        Err(err) => return Err(err),
    };

    let result = decide(svc, account, plain_text_password, now).await?;

    let account = match result.persist {
        Persist::Required    => svc.store().replace(&result.account).await?,
        Persist::NotRequired => result.account,
    };

    match result.outcome {
        Outcome::Success { password_expired } => {
            tracing::debug!("Account {} authenticated (password expired: {})", account.account_id, password_expired);
            Ok(AuthResponse::Authenticated(Principal::new(&account, password_expired)))
        },
        Outcome::RejectedBadSecret { attempts_remaining } => {
            tracing::debug!("Account {} failed authentication, {} attempts remain", account.account_id, attempts_remaining);
            Ok(AuthResponse::Rejected(Rejection::BadSecret { attempts_remaining }))
        },
        Outcome::RejectedLocked => {
            tracing::debug!("Account {} is locked", account.account_id);
            Ok(AuthResponse::Rejected(Rejection::Locked))
        },
        Outcome::RejectedLockedJustNow => {
            tracing::warn!("Account {} has been locked after too many failed attempts", account.account_id);

            svc.notify(CredentialEvent::AccountLocked(AccountLocked {
                account_id: account.account_id.clone(),
                locked_on: now,
            })).await;

            Ok(AuthResponse::Rejected(Rejection::Locked))
        },
    }
}

///
/// Run the email's stand-in account through the guard, so it answers exactly as a real account
/// with a wrong password would, lockout included.
///
async fn unknown_account(svc: &CredentialService, email: &str, plain_text_password: &str, now: DateTime<Utc>)
    -> Result<AuthResponse, GatekeeperError> {

    let account = svc.unknown_account(email, now);
    let result = decide(svc, account, plain_text_password, now).await?;
    let outcome = result.outcome;
    svc.keep_unknown_account(result.account);

    Ok(AuthResponse::Rejected(match outcome {
        Outcome::RejectedBadSecret { attempts_remaining } => Rejection::BadSecret { attempts_remaining },
        Outcome::RejectedLocked | Outcome::RejectedLockedJustNow => Rejection::Locked,

        // Nobody holds the dummy password, but never let it in.
        Outcome::Success { .. } => Rejection::BadSecret {
            attempts_remaining: svc.guard().max_failed_attempts.saturating_sub(1)
        },
    }))
}

///
/// Verification runs inside the guard, so the whole decision goes to the blocking pool. A locked
/// account skips verification in the guard, so the same effort is spent on the dummy hash instead.
///
async fn decide(svc: &CredentialService, account: Account, plain_text_password: &str, now: DateTime<Utc>)
    -> Result<Authentication, GatekeeperError> {

    let guard = svc.guard().clone();
    let passwords = svc.passwords().clone();
    let dummy_hash = svc.dummy_hash.clone();
    let plain_text_password = plain_text_password.to_string();

    off_the_event_loop(move || {
        let result = guard.authenticate(&account, &plain_text_password, now, &passwords);

        if result.outcome == Outcome::RejectedLocked {
            if let Err(err) = passwords.verify_secret(&plain_text_password, &dummy_hash) {
                tracing::warn!("Unable to verify against the dummy hash: {}", err);
            }
        }

        Ok(result)
    }).await
}
