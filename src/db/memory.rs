use std::collections::HashMap;
use parking_lot::Mutex;
use async_trait::async_trait;
use crate::db::AccountStore;
use crate::model::account::{Account, normalise_email};
use crate::utils::errors::{ErrorCode, GatekeeperError};

///
/// An in-process account store with the same compare-and-swap semantics as the MongoDB one.
///
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.lock().is_empty()
    }
}

fn not_found() -> GatekeeperError {
    ErrorCode::AccountNotFound.with_msg("The account requested does not exist")
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn load(&self, account_id: &str) -> Result<Account, GatekeeperError> {
        self.accounts.lock()
            .get(account_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, GatekeeperError> {
        let email = normalise_email(email);

        self.accounts.lock()
            .values()
            .find(|account| account.email == email)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn insert(&self, account: &Account) -> Result<(), GatekeeperError> {
        let mut accounts = self.accounts.lock();

        if accounts.contains_key(&account.account_id)
            || accounts.values().any(|existing| existing.email == account.email) {
            return Err(ErrorCode::DuplicateAccount.with_msg("An account with that id or email already exists"))
        }

        accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn replace(&self, account: &Account) -> Result<Account, GatekeeperError> {
        let mut accounts = self.accounts.lock();

        let stored = accounts.get_mut(&account.account_id).ok_or_else(not_found)?;

        if stored.version != account.version {
            return Err(ErrorCode::ConcurrentModification
                .with_msg(&format!("Account {} was modified by another request", account.account_id)))
        }

        let mut updated = account.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn close(&self) -> Result<(), GatekeeperError> {
        self.accounts.lock().clear();
        Ok(())
    }
}
