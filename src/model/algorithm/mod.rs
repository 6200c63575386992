pub mod argon;
pub mod bcrypt;

use std::str::FromStr;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::utils::errors::{ErrorCode, GatekeeperError};

#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq)]
pub enum Algorithm {
    Argon,
    BCrypt,
}


///
/// Validate if the plain_text_password matches the hashed password provided.
///
/// The algorithm is constructed and used from the PHC string provided.
///
pub fn validate(plain_text_password: &str, phc: &str) -> Result<bool, GatekeeperError> {
    match select(phc)? {
        Algorithm::Argon  => argon::validate(phc, plain_text_password),
        Algorithm::BCrypt => bcrypt::validate(phc, plain_text_password),
    }
}

///
/// Parse the first part of the phc string and return the algorithm.
///
fn select(phc: &str) -> Result<Algorithm, GatekeeperError> {
    let mut split = phc.split('$');
    split.next(); /* Skip first it's blank */

    match split.next() {
        Some(algorithm) => Algorithm::from_str(algorithm),
        None => Err(ErrorCode::InvalidPHCFormat.with_msg("The PHC is invalid, there's no algorithm")),
    }
}

impl FromStr for Algorithm {
    type Err = GatekeeperError;

    fn from_str(input: &str) -> Result<Algorithm, Self::Err> {
        match input {
            "argon2i"  |
            "argon2d"  |
            "argon2id" => Ok(Algorithm::Argon),

            "2a" |
            "2b" |
            "2x" |
            "2y" => Ok(Algorithm::BCrypt),

            _ => Err(ErrorCode::InvalidPHCFormat.with_msg(&format!("algorithm {} is un-handled", input))),
        }
    }
}
