use std::fmt::Write;
use std::str::FromStr;
use std::env::VarError;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use chrono::Duration;
use crate::model::{algorithm::{Algorithm, argon::{ArgonHashType, ArgonPolicy}, bcrypt::BCryptPolicy}, guard::GuardPolicy, policy::{PasswordPolicy, StrengthRules}};
use super::errors::GatekeeperError;

///
/// The library configuration - initialised by the embedding application at start-up.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub db_name: String,                   // The MongoDB name to use.
    pub mongo_uri: String,                 // The MongoDB connection URI. $USERNAME and $PASSWORD are replaced from mongo_credentials.
    pub mongo_credentials: Option<String>, // A secrets file holding the MongoDB username and password on two lines.
    pub kafka_servers: String,             // The Kafka brokers.
    pub kafka_timeout: i32,                // The Kafka message timeout in ms.
    pub distributed_tracing: bool,         // Send spans to jaeger as well as the console.
    pub jaeger_endpoint: Option<String>,   // If this is the jaeger endpoint to send traces to.
    pub hash_algorithm: Algorithm,         // The algorithm new passwords are hashed with.
    pub bcrypt_cost: u32,
    pub argon_memory_kb: u32,
    pub argon_iterations: u32,
    pub argon_hash_type: String,           // argon2id, argon2i or argon2d.
    pub max_failed_attempts: u32,          // Failures inside one window before an account locks.
    pub failure_window_hours: i64,         // How long failures accumulate before they're forgiven.
    pub rotation_days: i64,                // Password lifetime for standard accounts.
    pub superuser_rotation_days: i64,      // Password lifetime (and creation grace period) for superusers.
    pub temporary_secret_length: usize,
}

impl Configuration {
    ///
    /// Load the library's configuration.
    ///
    pub fn from_env() -> Result<Configuration, ConfigError> {
        let mut cfg = config::Config::default();

        // Merge any environment variables with the same name as the struct fields.
        cfg.merge(config::Environment::new())?;

        // Set defaults for settings that were not specified.
        cfg.set_default("db_name", "Gatekeeper")?;
        cfg.set_default("mongo_uri", "mongodb://localhost:27017")?;
        cfg.set_default("mongo_credentials", None::<String>)?;
        cfg.set_default("kafka_servers", "localhost:29092")?;
        cfg.set_default("kafka_timeout", 5000)?;
        cfg.set_default("distributed_tracing", false)?;
        cfg.set_default("jaeger_endpoint", None::<String>)?;
        cfg.set_default("hash_algorithm", "BCrypt")?;
        cfg.set_default("bcrypt_cost", 10)?;
        cfg.set_default("argon_memory_kb", 1024 * 16)?;
        cfg.set_default("argon_iterations", 2)?;
        cfg.set_default("argon_hash_type", "argon2id")?;
        cfg.set_default("max_failed_attempts", 5)?;
        cfg.set_default("failure_window_hours", 24)?;
        cfg.set_default("rotation_days", 30)?;
        cfg.set_default("superuser_rotation_days", 90)?;
        cfg.set_default("temporary_secret_length", 16)?;

        let config: Configuration = cfg.try_into()?;

        Ok(config)
    }

    ///
    /// The lockout rules described by this configuration.
    ///
    pub fn guard_policy(&self) -> GuardPolicy {
        GuardPolicy {
            max_failed_attempts: self.max_failed_attempts,
            failure_window: Duration::hours(self.failure_window_hours),
        }
    }

    ///
    /// The hashing, strength and rotation rules described by this configuration.
    ///
    pub fn password_policy(&self) -> Result<PasswordPolicy, GatekeeperError> {
        Ok(PasswordPolicy {
            algorithm: self.hash_algorithm,
            bcrypt_policy: BCryptPolicy { cost: self.bcrypt_cost },
            argon_policy: ArgonPolicy {
                memory_size_kb: self.argon_memory_kb,
                iterations: self.argon_iterations,
                hash_type: ArgonHashType::from_str(&self.argon_hash_type)?,
                ..ArgonPolicy::default()
            },
            strength: StrengthRules::default(),
            rotation: Duration::days(self.rotation_days),
            superuser_rotation: Duration::days(self.superuser_rotation_days),
            temporary_secret_length: self.temporary_secret_length,
        })
    }

    ///
    /// Pretty-print the config with ansi colours.
    ///
    pub fn fmt_console(&self) -> Result<String, GatekeeperError> {
        // Serialise to JSON so we have fields to iterate.
        let values = serde_json::to_value(&self)?;

        let mut output = String::new();
        if let Some(values) = values.as_object() {
            // Sort by keys.
            let mut sorted: Vec<_> = values.iter().collect();
            sorted.sort_by_key(|a| a.0);

            for (k, v) in sorted {
                let _ = writeln!(&mut output, "{:>23}: {}", k, v);
            }
        }

        Ok(output)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            db_name: String::from("Gatekeeper"),
            mongo_uri: String::from("mongodb://localhost:27017"),
            mongo_credentials: None,
            kafka_servers: String::from("localhost:29092"),
            kafka_timeout: 5000,
            distributed_tracing: false,
            jaeger_endpoint: None,
            hash_algorithm: Algorithm::BCrypt,
            bcrypt_cost: 10,
            argon_memory_kb: 1024 * 16,
            argon_iterations: 2,
            argon_hash_type: String::from("argon2id"),
            max_failed_attempts: 5,
            failure_window_hours: 24,
            rotation_days: 30,
            superuser_rotation_days: 90,
            temporary_secret_length: 16,
        }
    }
}

///
/// If the specified environment variable is not set for this process, set it to the default value specified.
///
pub fn default_env(key: &str, value: &str) {
    if let Err(VarError::NotPresent) = std::env::var(key) {
        std::env::set_var(key, value);
    }
}
