use std::fmt;
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, rngs::OsRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use crate::utils::{errors::{ErrorCode, GatekeeperError}, generate_id};
use super::{account::{Account, UserType, normalise_email}, algorithm::{self, Algorithm, argon::ArgonPolicy, bcrypt::BCryptPolicy}};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBERS:   &[u8] = b"0123456789";
const SYMBOLS:   &[u8] = b"!#$%&*+-=?@^_~";

///
/// The shape a plain text password must have before it is hashed.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StrengthRules {
    pub min_length: u32,
    pub max_length: u32,
    pub min_lowercase: u32,
    pub min_uppercase: u32,
    pub min_numbers: u32,
    pub min_symbols: u32,
}

impl Default for StrengthRules {
    fn default() -> Self {
        StrengthRules {
            min_length: 8,
            max_length: 128,
            min_lowercase: 1,
            min_uppercase: 1,
            min_numbers: 1,
            min_symbols: 1,
        }
    }
}

impl StrengthRules {
    ///
    /// Check the plain text password doesn't violate these rules.
    ///
    /// Whitespace anywhere inside the password is an InvalidSecret, everything else is a WeakSecret.
    ///
    pub fn validate_pattern(&self, plain_text_password: &str) -> Result<(), GatekeeperError> {
        if plain_text_password.chars().any(char::is_whitespace) {
            return Err(ErrorCode::InvalidSecret
                .with_msg("passwords cannot contain empty spaces"))
        }

        let length = plain_text_password.chars().count();

        if length < self.min_length as usize {
            return Err(ErrorCode::WeakSecret
                .with_msg(&format!("passwords must be at least {} characters", self.min_length)))
        }

        if length > self.max_length as usize {
            return Err(ErrorCode::WeakSecret
                .with_msg(&format!("passwords may not be more than {} characters", self.max_length)))
        }

        let count = |predicate: fn(&char) -> bool| plain_text_password.chars().filter(predicate).count();

        if count(|c| c.is_lowercase()) < self.min_lowercase as usize {
            return Err(ErrorCode::WeakSecret
                .with_msg(&format!("a password must contain at least {} lower case letters", self.min_lowercase)))
        }

        if count(|c| c.is_uppercase()) < self.min_uppercase as usize {
            return Err(ErrorCode::WeakSecret
                .with_msg(&format!("a password must contain at least {} upper case letters", self.min_uppercase)))
        }

        if count(|c| c.is_numeric()) < self.min_numbers as usize {
            return Err(ErrorCode::WeakSecret
                .with_msg(&format!("a password must contain at least {} numbers", self.min_numbers)))
        }

        if count(|c| !c.is_alphanumeric()) < self.min_symbols as usize {
            return Err(ErrorCode::WeakSecret
                .with_msg(&format!("a password must contain at least {} symbols", self.min_symbols)))
        }

        Ok(())
    }
}

///
/// A system generated password. It is handed to the caller once for out-of-band delivery and
/// never stored in plain text.
///
#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct TemporarySecret(String);

impl TemporarySecret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TemporarySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemporarySecret(<redacted>)")
    }
}

///
/// Hashing, strength and rotation rules for account passwords.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordPolicy {
    pub algorithm: Algorithm,
    pub bcrypt_policy: BCryptPolicy,
    pub argon_policy: ArgonPolicy,
    pub strength: StrengthRules,
    pub rotation: Duration,
    pub superuser_rotation: Duration,
    pub temporary_secret_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        PasswordPolicy {
            algorithm: Algorithm::BCrypt,
            bcrypt_policy: BCryptPolicy::default(),
            argon_policy: ArgonPolicy::default(),
            strength: StrengthRules::default(),
            rotation: Duration::days(30),
            superuser_rotation: Duration::days(90),
            temporary_secret_length: 16,
        }
    }
}

impl PasswordPolicy {
    ///
    /// Validate then hash the password into a PHC string with the configured algorithm.
    ///
    /// Surrounding whitespace is trimmed first, any left inside the password is rejected.
    ///
    /// ref: https://github.com/P-H-C/phc-string-format/blob/master/phc-sf-spec.md
    ///
    pub fn hash_secret(&self, plain_text_password: &str) -> Result<String, GatekeeperError> {
        let plain_text_password = plain_text_password.trim();
        self.strength.validate_pattern(plain_text_password)?;
        self.hash_into_phc(plain_text_password)
    }

    fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, GatekeeperError> {
        match self.algorithm {
            Algorithm::Argon  => self.argon_policy.hash_into_phc(plain_text_password),
            Algorithm::BCrypt => self.bcrypt_policy.hash_into_phc(plain_text_password),
        }
    }

    ///
    /// Check a plain text password against a stored hash. The algorithm comes from the hash, so
    /// passwords hashed under a previous policy still verify.
    ///
    pub fn verify_secret(&self, plain_text_password: &str, phc: &str) -> Result<bool, GatekeeperError> {
        algorithm::validate(plain_text_password, phc)
    }

    pub fn is_expired(&self, account: &Account, now: DateTime<Utc>) -> bool {
        now >= account.password_expiration_date
    }

    pub fn rotation_for(&self, user_type: UserType) -> Duration {
        match user_type {
            UserType::Standard  => self.rotation,
            UserType::Superuser => self.superuser_rotation,
        }
    }

    ///
    /// A brand new account. Standard accounts must change their password on first login,
    /// superusers get their rotation period as a grace period.
    ///
    pub fn new_account(&self, email: &str, plain_text_password: &str, user_type: UserType, now: DateTime<Utc>)
        -> Result<Account, GatekeeperError> {

        let password_hash = self.hash_secret(plain_text_password)?;

        let password_expiration_date = match user_type {
            UserType::Standard  => now,
            UserType::Superuser => now + self.superuser_rotation,
        };

        Ok(Account {
            account_id: generate_id(),
            email: normalise_email(email),
            user_type,
            password_hash,
            is_locked: false,
            failed_login_attempts: 0,
            login_attempts_reset_date: now,
            password_expiration_date,
            version: 0,
        })
    }

    ///
    /// Replace the password and push the expiration date out by the account's rotation period.
    ///
    pub fn rotate_secret(&self, account: &Account, new_plain_text_password: &str, now: DateTime<Utc>)
        -> Result<Account, GatekeeperError> {

        let password_hash = self.hash_secret(new_plain_text_password)?;

        let mut account = account.clone();
        account.password_hash = password_hash;
        account.password_expiration_date = now + self.rotation_for(account.user_type);
        Ok(account)
    }

    ///
    /// Replace the password with a random one which has already expired, forcing a change on
    /// the next login.
    ///
    pub fn issue_temporary_secret(&self, account: &Account, now: DateTime<Utc>)
        -> Result<(TemporarySecret, Account), GatekeeperError> {

        let secret = self.generate_temporary_secret();
        let password_hash = self.hash_secret(secret.expose())?;

        let mut account = account.clone();
        account.password_hash = password_hash;
        account.password_expiration_date = now;
        Ok((secret, account))
    }

    ///
    /// Draw from the OS random source. One character from each class the strength rules ask for
    /// is always included so the result passes our own validation.
    ///
    pub(crate) fn generate_temporary_secret(&self) -> TemporarySecret {
        let mut rng = OsRng;
        let classes = [LOWERCASE, UPPERCASE, NUMBERS, SYMBOLS];
        let all: Vec<u8> = classes.concat();

        let length = self.temporary_secret_length
            .max(self.strength.min_length as usize)
            .max(classes.len());

        let mut chars: Vec<u8> = classes
            .iter()
            .map(|class| class[rng.gen_range(0..class.len())])
            .collect();

        while chars.len() < length {
            chars.push(all[rng.gen_range(0..all.len())]);
        }

        chars.shuffle(&mut rng);
        TemporarySecret(chars.into_iter().map(char::from).collect())
    }
}
