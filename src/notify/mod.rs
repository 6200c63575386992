#[cfg(feature = "kafka")]
pub mod kafka;

use async_trait::async_trait;
use crate::{model::events::CredentialEvent, utils::errors::GatekeeperError};

///
/// The delivery collaborator. Receives lock/unlock/rotation notifications and the temporary
/// passwords which must reach the account holder out-of-band (email etc.).
///
/// This crate never transmits a secret itself - it only hands it to a Notifier.
///
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: CredentialEvent) -> Result<(), GatekeeperError>;
}
