use crate::model::account::{AccountView, UserType};
use crate::utils::errors::GatekeeperError;
use super::{CredentialService, off_the_event_loop};

pub async fn create_account(svc: &CredentialService, email: &str, plain_text_password: &str, user_type: UserType)
    -> Result<AccountView, GatekeeperError> {

    let now = svc.now();
    let passwords = svc.passwords().clone();
    let email = email.to_string();
    let plain_text_password = plain_text_password.to_string();
    let account = off_the_event_loop(move || passwords.new_account(&email, &plain_text_password, user_type, now)).await?;

    svc.store().insert(&account).await?;
    svc.forget_unknown_account(&account.email);

    tracing::info!("Created {} account {}", account.user_type, account.account_id);
    Ok(AccountView::from(&account))
}
