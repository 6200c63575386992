mod authenticate;
mod change_password;
mod create_account;
mod start_reset;
mod unlock;

pub use authenticate::{AuthResponse, Rejection};

use std::{collections::HashMap, sync::Arc};
use parking_lot::{Mutex, RwLock};
use tracing::instrument;
use chrono::{DateTime, Duration, Utc};
use crate::db::AccountStore;
use crate::notify::Notifier;
use crate::model::{account::{Account, AccountView, UserType, normalise_email}, events::CredentialEvent, guard::GuardPolicy, policy::PasswordPolicy};
use crate::utils::{config::Configuration, errors::GatekeeperError, time_provider::TimeProvider};

///
/// The caller-facing entry points. Each call loads one account, lets the guard and password policy
/// decide, writes the new snapshot back with a compare-and-swap and tells the notifier.
///
/// The only state held between calls is the failure tracking for emails which have no account.
///
pub struct CredentialService {
    store: Arc<dyn AccountStore>,
    notifier: Arc<dyn Notifier>,
    guard: GuardPolicy,
    passwords: PasswordPolicy,
    time_provider: RwLock<TimeProvider>,

    // Verified against whenever no real hash is checked, so every path costs the same.
    dummy_hash: String,

    // Stand-in accounts for unknown emails, keyed by normalised email. They count down and lock
    // exactly like real accounts so the responses can't be told apart.
    unknown_emails: Mutex<HashMap<String, Account>>,
}

impl CredentialService {
    pub fn new(config: &Configuration, store: Arc<dyn AccountStore>, notifier: Arc<dyn Notifier>) -> Result<Self, GatekeeperError> {
        Self::with_policies(config.guard_policy(), config.password_policy()?, store, notifier)
    }

    pub fn with_policies(guard: GuardPolicy, passwords: PasswordPolicy, store: Arc<dyn AccountStore>, notifier: Arc<dyn Notifier>)
        -> Result<Self, GatekeeperError> {

        let dummy_hash = passwords.hash_secret(passwords.generate_temporary_secret().expose())?;

        Ok(CredentialService {
            store,
            notifier,
            guard,
            passwords,
            time_provider: RwLock::new(TimeProvider::default()),
            dummy_hash,
            unknown_emails: Mutex::new(HashMap::new()),
        })
    }

    #[instrument(skip(self, plain_text_password))]
    pub async fn create_account(&self, email: &str, plain_text_password: &str, user_type: UserType) -> Result<AccountView, GatekeeperError> {
        create_account::create_account(self, email, plain_text_password, user_type).await
    }

    #[instrument(skip(self, email, plain_text_password))]
    pub async fn authenticate(&self, email: &str, plain_text_password: &str) -> Result<AuthResponse, GatekeeperError> {
        authenticate::authenticate(self, email, plain_text_password).await
    }

    #[instrument(skip(self))]
    pub async fn unlock(&self, account_id: &str) -> Result<AccountView, GatekeeperError> {
        unlock::unlock(self, account_id).await
    }

    #[instrument(skip(self, email))]
    pub async fn start_reset(&self, email: &str) -> Result<(), GatekeeperError> {
        start_reset::start_reset(self, email).await
    }

    #[instrument(skip(self, new_plain_text_password))]
    pub async fn change_password(&self, account_id: &str, new_plain_text_password: &str) -> Result<AccountView, GatekeeperError> {
        change_password::change_password(self, account_id, new_plain_text_password).await
    }

    ///
    /// Close the underlying store. The service should not be used afterwards.
    ///
    pub async fn close(&self) -> Result<(), GatekeeperError> {
        self.store.close().await
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_provider.read().now()
    }

    ///
    /// Set or clear the fixed time.
    ///
    pub fn set_now(&self, now: Option<DateTime<Utc>>) {
        self.time_provider.write().fix(now);
    }

    pub fn advance(&self, by: Duration) {
        self.time_provider.write().advance(by);
    }

    pub fn guard(&self) -> &GuardPolicy {
        &self.guard
    }

    pub fn passwords(&self) -> &PasswordPolicy {
        &self.passwords
    }

    fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    ///
    /// The stand-in for an email with no account. A new one is created the first time an email is
    /// seen, and again once an unlocked one's failure window has passed.
    ///
    fn unknown_account(&self, email: &str, now: DateTime<Utc>) -> Account {
        let email = normalise_email(email);
        let mut unknown = self.unknown_emails.lock();

        // Forget stand-ins which would have forgiven their failures anyway.
        unknown.retain(|_, account| account.is_locked || now < account.login_attempts_reset_date);

        unknown.entry(email.clone())
            .or_insert_with(|| Account {
                account_id: String::new(),
                email,
                user_type: UserType::Standard,
                password_hash: self.dummy_hash.clone(),
                is_locked: false,
                failed_login_attempts: 0,
                login_attempts_reset_date: now,
                password_expiration_date: now,
                version: 0,
            })
            .clone()
    }

    fn keep_unknown_account(&self, account: Account) {
        self.unknown_emails.lock().insert(account.email.clone(), account);
    }

    fn forget_unknown_account(&self, email: &str) {
        self.unknown_emails.lock().remove(&normalise_email(email));
    }

    ///
    /// Send an informational event. The decision it reports has already been persisted, so a
    /// delivery failure is logged rather than failing the request.
    ///
    async fn notify(&self, event: CredentialEvent) {
        let topic = event.topic();
        if let Err(err) = self.notifier.send(event).await {
            tracing::warn!("Unable to send {} notification: {}", topic, err);
        }
    }
}

///
/// Hashing and verification are highly CPU-bound, so run them on the blocking thread pool rather
/// than the main event loop.
///
async fn off_the_event_loop<T, F>(f: F) -> Result<T, GatekeeperError>
where
    F: FnOnce() -> Result<T, GatekeeperError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(GatekeeperError::from)?
}
