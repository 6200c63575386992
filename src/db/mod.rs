pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use crate::{model::account::Account, utils::errors::GatekeeperError};

pub mod prelude {
    // Collection names.
    pub const ACCOUNTS: &str = "Accounts";

    // Field names.
    pub const ACCOUNT_ID: &str = "account_id";
    pub const EMAIL:      &str = "email";
    pub const VERSION:    &str = "version";
}

///
/// Durable storage for accounts.
///
/// Every credential decision is a read-modify-write of a single account, so `replace` must be an
/// atomic compare-and-swap on the account's version. Two concurrent failures that both read the
/// same counter must not both succeed in writing it back.
///
#[async_trait]
pub trait AccountStore: Send + Sync {
    ///
    /// Load an account by id, failing with AccountNotFound if there isn't one.
    ///
    async fn load(&self, account_id: &str) -> Result<Account, GatekeeperError>;

    ///
    /// Load an account by its (normalised) login email, failing with AccountNotFound if there isn't one.
    ///
    async fn find_by_email(&self, email: &str) -> Result<Account, GatekeeperError>;

    ///
    /// Store a new account, failing with DuplicateAccount if the id or email is taken.
    ///
    async fn insert(&self, account: &Account) -> Result<(), GatekeeperError>;

    ///
    /// Write the account back if the stored version still matches `account.version`. Returns the
    /// account with its new version, or fails with ConcurrentModification.
    ///
    async fn replace(&self, account: &Account) -> Result<Account, GatekeeperError>;

    ///
    /// Release any resources held by the store.
    ///
    async fn close(&self) -> Result<(), GatekeeperError>;
}
