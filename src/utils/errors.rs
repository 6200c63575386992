use std::fmt;
use bcrypt::BcryptError;
use derive_more::Display;
use tokio::task::JoinError;

#[cfg(feature = "kafka")]
use rdkafka::{error::KafkaError, message::OwnedMessage};

#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum ErrorCode {
    HashThreadingIssue              = 0401,
    UnableToReadCredentials         = 0500,
    MongoDBError                    = 0503,
    InvalidJSON                     = 0505,
    KafkaSendError                  = 0506,
    InvalidAlgorithmConfig          = 0508,
    HashingError                    = 0509,
    InvalidPHCFormat                = 0510,
    UnknownAlgorithmVariant         = 0511,
    InvalidConfiguration            = 0512,
    WeakSecret                      = 2001,
    InvalidSecret                   = 2002,
    AccountNotFound                 = 2101,
    DuplicateAccount                = 2102,
    ConcurrentModification          = 2103,
}

impl ErrorCode {
    pub fn with_msg(&self, message: &str) -> GatekeeperError {
        GatekeeperError::new(*self, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GatekeeperError {
    error_code: ErrorCode,
    message: String,
}

impl GatekeeperError {
    pub fn new(error_code: ErrorCode, message: &str) -> Self {
        GatekeeperError { error_code, message: message.to_string() }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    ///
    /// True for the validation failures raised by the password policy before any state changes.
    ///
    pub fn is_validation(&self) -> bool {
        matches!(self.error_code, ErrorCode::WeakSecret | ErrorCode::InvalidSecret)
    }
}

impl fmt::Display for GatekeeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:04}): {}", self.error_code, self.error_code as u32, self.message)
    }
}

impl std::error::Error for GatekeeperError {}

impl From<argon2::Error> for GatekeeperError {
    fn from(error: argon2::Error) -> Self {
        ErrorCode::InvalidAlgorithmConfig.with_msg(&format!("Invalid configuration for algorithm: {}", error))
    }
}

impl From<password_hash::Error> for GatekeeperError {
    fn from(error: password_hash::Error) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash password: {}", error))
    }
}

impl From<serde_json::Error> for GatekeeperError {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::InvalidJSON.with_msg(&format!("Unable to convert to json: {}", error))
    }
}

impl From<mongodb::error::Error> for GatekeeperError {
    fn from(error: mongodb::error::Error) -> Self {
        ErrorCode::MongoDBError.with_msg(&format!("MongoDB error: {}", error))
    }
}

impl From<JoinError> for GatekeeperError {
    fn from(error: JoinError) -> Self {
        ErrorCode::HashThreadingIssue.with_msg(&format!("Unable to hash: {}", error))
    }
}

impl From<BcryptError> for GatekeeperError {
    fn from(error: BcryptError) -> Self {
        ErrorCode::InvalidAlgorithmConfig.with_msg(&format!("Unable to verify: {}", error))
    }
}

impl From<config::ConfigError> for GatekeeperError {
    fn from(error: config::ConfigError) -> Self {
        ErrorCode::InvalidConfiguration.with_msg(&format!("The service configuration is not correct: {}", error))
    }
}

#[cfg(feature = "kafka")]
impl From<(KafkaError, OwnedMessage)> for GatekeeperError {
    fn from((error, _message): (KafkaError, OwnedMessage)) -> Self {
        // The message may carry a temporary password so only the error is reported.
        ErrorCode::KafkaSendError.with_msg(&format!("Kafka error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_the_numeric_code() {
        let error = ErrorCode::WeakSecret.with_msg("too short");
        assert_eq!(error.to_string(), "WeakSecret (2001): too short");
    }

    #[test]
    fn test_only_policy_failures_are_validation_errors() {
        assert!(ErrorCode::WeakSecret.with_msg("").is_validation());
        assert!(ErrorCode::InvalidSecret.with_msg("").is_validation());
        assert!(!ErrorCode::AccountNotFound.with_msg("").is_validation());
    }
}
