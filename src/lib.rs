pub mod db;
pub mod model;
pub mod notify;
pub mod services;
pub mod utils;

use dotenv::dotenv;
use utils::{config::Configuration, errors::GatekeeperError};

pub use db::{AccountStore, memory::MemoryStore, mongo::MongoStore};
pub use model::{account::{Account, AccountView, Principal, UserType}, guard::{GuardPolicy, Outcome}, policy::{PasswordPolicy, TemporarySecret}};
pub use notify::Notifier;
pub use services::{AuthResponse, CredentialService, Rejection};

///
/// Load the library configuration from the environment, after any local dev settings in a .env
/// file have been applied.
///
pub fn load_config() -> Result<Configuration, GatekeeperError> {
    dotenv().ok();
    Ok(Configuration::from_env()?)
}
