use rand_core::OsRng;
use std::str::FromStr;
use derive_more::Display;
use std::convert::TryFrom;
use serde::{Deserialize, Serialize};
use argon2::{Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version, password_hash::SaltString};
use crate::utils::errors::{ErrorCode, GatekeeperError};

#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq)]
pub enum ArgonHashType {
    ARGON2D,
    ARGON2I,
    ARGON2ID
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ArgonPolicy {
    pub parallelism: u32,
    pub tag_length: u32,
    pub memory_size_kb: u32,
    pub iterations: u32,
    pub version: u32,
    pub hash_type: ArgonHashType
}


pub fn validate(phc: &str, plain_text_password: &str) -> Result<bool, GatekeeperError> {
    let parsed_hash = PasswordHash::new(phc)?;

    // The parameters come from the PHC string, not from the default instance.
    match Argon2::default().verify_password(plain_text_password.as_bytes(), &parsed_hash) {
        Ok(_)  => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(GatekeeperError::from(err)),
    }
}


impl Default for ArgonPolicy {
    fn default() -> Self {
        ArgonPolicy {
            parallelism: 1,
            tag_length: 32,
            memory_size_kb: 1024 * 16,
            iterations: 2,
            version: 19,
            hash_type: ArgonHashType::ARGON2ID
        }
    }
}

impl ArgonPolicy {
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, GatekeeperError> {
        let password = plain_text_password.as_bytes();
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.memory_size_kb,
            self.iterations,
            self.parallelism,
            Some(self.tag_length as usize))?;

        let argon2 = Argon2::new(
            self.hash_type.into(),
            Version::try_from(self.version)?,
            params);

        // Hash password to PHC string ($argon2id$v=19$...)
        Ok(argon2.hash_password(password, salt.as_str())?.to_string())
    }
}

impl From<ArgonHashType> for argon2::Algorithm {
    fn from(hash_type: ArgonHashType) -> Self {
        match hash_type {
            ArgonHashType::ARGON2D  => argon2::Algorithm::Argon2d,
            ArgonHashType::ARGON2I  => argon2::Algorithm::Argon2i,
            ArgonHashType::ARGON2ID => argon2::Algorithm::Argon2id,
        }
    }
}


impl FromStr for ArgonHashType {
    type Err = GatekeeperError;

    fn from_str(input: &str) -> Result<ArgonHashType, Self::Err> {
        match input {
            "argon2i"  => Ok(ArgonHashType::ARGON2I),
            "argon2d"  => Ok(ArgonHashType::ARGON2D),
            "argon2id" => Ok(ArgonHashType::ARGON2ID),
            _          => Err(ErrorCode::UnknownAlgorithmVariant.with_msg(&format!("Unknown argon variant {}", input))),
        }
    }
}
