//! Password strength checks and hashing for the local backend.
//!
//! The hosted backend applies its own password policy, so these types are only
//! used where this service stores credentials itself.

use std::fmt::{Debug, Display};

use bcrypt::{hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that has passed the strength check, but has not been hashed.
#[derive(Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check that `raw_password` is hard to guess.
    ///
    /// `user_inputs` are things like the user's email and name, which make a
    /// password weaker when it contains them.
    ///
    /// # Errors
    /// Returns [Error::TooWeak] with zxcvbn's advice on how to make the password stronger.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, user_inputs);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => {
                let feedback = analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string();
                let advice = if feedback.trim().is_empty() {
                    "try a longer password".to_owned()
                } else {
                    feedback
                };

                Err(Error::TooWeak(advice))
            }
        }
    }

    /// Wrap `raw_password` without checking its strength, e.g. for seeding demo data.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

impl Debug for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValidatedPassword({self})")
    }
}

/// A salted bcrypt hash of a password, as stored in the `user` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if bcrypt rejects the cost or fails.
    pub fn new(password: &ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash that was read back from the database.
    pub fn from_stored(stored_hash: String) -> Self {
        Self(stored_hash)
    }

    /// The hash in the form it is stored in.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `raw_password` is the password this hash was made from.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}
