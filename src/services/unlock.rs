use crate::model::{account::AccountView, events::{AccountUnlocked, CredentialEvent}};
use crate::utils::errors::GatekeeperError;
use super::CredentialService;

///
/// Administrative unlock. The caller is trusted to have authorised this, no secret is checked.
///
pub async fn unlock(svc: &CredentialService, account_id: &str) -> Result<AccountView, GatekeeperError> {
    let account = svc.store().load(account_id).await?;
    let account = svc.store().replace(&svc.guard().unlock(&account, svc.now())).await?;

    tracing::info!("Account {} has been unlocked", account.account_id);

    svc.notify(CredentialEvent::AccountUnlocked(AccountUnlocked {
        account_id: account.account_id.clone()
    })).await;

    Ok(AccountView::from(&account))
}
