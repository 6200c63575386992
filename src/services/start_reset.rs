use crate::model::events::{CredentialEvent, TemporarySecretIssued};
use crate::utils::errors::{ErrorCode, GatekeeperError};
use super::{CredentialService, off_the_event_loop};

///
/// Replace the account's password with a temporary one and hand it to the notifier for delivery.
///
/// Unknown emails and locked accounts are ignored without telling the caller, so the response
/// reveals nothing about which emails are registered.
///
pub async fn start_reset(svc: &CredentialService, email: &str) -> Result<(), GatekeeperError> {
    let account = match svc.store().find_by_email(email).await {
        Ok(account) => account,
        Err(err) if err.error_code() == ErrorCode::AccountNotFound => {
            tracing::debug!("Password reset requested for an unknown account");
            return Ok(())
        },
        Err(err) => return Err(err),
    };

    if account.is_locked {
        tracing::info!("Password reset requested for locked account {}, ignoring", account.account_id);
        return Ok(())
    }

    let now = svc.now();
    let passwords = svc.passwords().clone();
    let (temporary_secret, account) = off_the_event_loop(move || passwords.issue_temporary_secret(&account, now)).await?;

    // Deliver before saving. If delivery fails the old password must still work.
    svc.notifier.send(CredentialEvent::TemporarySecretIssued(TemporarySecretIssued {
        account_id: account.account_id.clone(),
        email: account.email.clone(),
        temporary_secret,
    })).await?;

    let account = svc.store().replace(&account).await?;

    tracing::info!("Temporary password issued for account {}", account.account_id);
    Ok(())
}
