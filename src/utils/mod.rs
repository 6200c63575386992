use uuid::Uuid;

pub mod config;
pub mod errors;
pub mod logging;
pub mod time_provider;

///
/// Account ids carry a 'U-' prefix so they can be told apart from other record ids in the application.
///
pub fn generate_id() -> String {
    format!("U-{}", Uuid::new_v4().to_hyphenated())
}
