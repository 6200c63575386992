use crate::model::{account::AccountView, events::{CredentialEvent, PasswordRotated}};
use crate::utils::errors::GatekeeperError;
use super::{CredentialService, off_the_event_loop};

///
/// Validate the new password, hash it and push the expiration date out by the account's rotation
/// period. A password which fails validation leaves the stored account untouched.
///
pub async fn change_password(svc: &CredentialService, account_id: &str, new_plain_text_password: &str)
    -> Result<AccountView, GatekeeperError> {

    let account = svc.store().load(account_id).await?;

    let now = svc.now();
    let passwords = svc.passwords().clone();
    let new_plain_text_password = new_plain_text_password.to_string();
    let account = off_the_event_loop(move || passwords.rotate_secret(&account, &new_plain_text_password, now)).await?;

    let account = svc.store().replace(&account).await?;

    tracing::info!("Password changed for account {}", account.account_id);

    svc.notify(CredentialEvent::PasswordRotated(PasswordRotated {
        account_id: account.account_id.clone(),
        expires_on: account.password_expiration_date,
    })).await;

    Ok(AccountView::from(&account))
}
