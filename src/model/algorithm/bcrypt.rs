use serde::{Deserialize, Serialize};
use crate::utils::errors::GatekeeperError;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BCryptPolicy {
    pub cost: u32
}

///
/// bcrypt compares the recomputed digest in constant time, so a mismatch reveals nothing about
/// how much of the hash matched.
///
pub fn validate(phc: &str, plain_text_password: &str) -> Result<bool, GatekeeperError> {
    bcrypt::verify(plain_text_password, phc).map_err(GatekeeperError::from)
}

impl Default for BCryptPolicy {
    fn default() -> Self {
        Self {
            cost: 10
        }
    }
}

impl BCryptPolicy {
    ///
    /// Hash into a '$2b$' string. bcrypt draws its own 16-byte salt from the OS random source.
    ///
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, GatekeeperError> {
        Ok(bcrypt::hash(plain_text_password, self.cost)?)
    }
}
