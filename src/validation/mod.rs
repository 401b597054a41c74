//! Declarative schemas for request payloads.
//!
//! Payloads are deserialized into loosely typed structs first, so that a
//! missing field or an unknown transaction type is reported as a validation
//! issue rather than a deserialization failure. Each schema collects every
//! issue it finds before failing.

mod auth;
mod transaction;

use std::fmt::Display;

use email_address::EmailAddress;
use serde::Serialize;

pub use auth::{
    ForgotPasswordPayload, MIN_PASSWORD_LENGTH, SignInPayload, SignUpPayload, UpdateUserPayload,
};
pub use transaction::{TransactionPayload, TransactionQuery};
pub(crate) use transaction::parse_date;

/// A single problem with a payload, attached to the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// The name of the offending field as the client sent it, e.g. `confirmPassword`.
    ///
    /// Empty for issues that concern the payload as a whole.
    pub path: String,
    /// A message for the user.
    pub message: String,
}

impl ValidationIssue {
    /// Create an issue for the field at `path`.
    pub fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.to_owned(),
            message: message.to_owned(),
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// The issues found while validating a payload. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    /// Create a set of errors with exactly one issue.
    pub fn single(path: &str, message: &str) -> Self {
        Self(vec![ValidationIssue::new(path, message)])
    }

    /// The issues in the order they were found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    /// Whether any issue is attached to the field at `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.0.iter().any(|issue| issue.path == path)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }

        Ok(())
    }
}

/// Check that two fields hold the same value.
///
/// Returns an issue attached to `path`, which should name the second field
/// (e.g. `confirmPassword`), if the values differ.
pub fn refine_fields_match<T: PartialEq + ?Sized>(
    first: &T,
    second: &T,
    path: &str,
    message: &str,
) -> Option<ValidationIssue> {
    if first == second {
        None
    } else {
        Some(ValidationIssue::new(path, message))
    }
}

/// Collects issues while the fields of a payload are checked one by one.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn issue(&mut self, path: &str, message: &str) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    pub(crate) fn refine(&mut self, issue: Option<ValidationIssue>) {
        if let Some(issue) = issue {
            self.issues.push(issue);
        }
    }

    /// Require a string that is not blank, returning it trimmed.
    pub(crate) fn non_empty(
        &mut self,
        path: &str,
        value: Option<String>,
        message: &str,
    ) -> Option<String> {
        match value.map(|value| value.trim().to_owned()) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                self.issue(path, message);
                None
            }
        }
    }

    /// Require a syntactically valid email address, returning it trimmed.
    pub(crate) fn email(&mut self, path: &str, value: Option<String>) -> Option<String> {
        let email = self.non_empty(path, value, "Email is required")?;

        if EmailAddress::is_valid(&email) {
            Some(email)
        } else {
            self.issue(path, "Invalid email");
            None
        }
    }

    /// Require a password of at least [MIN_PASSWORD_LENGTH] characters.
    ///
    /// Passwords are not trimmed.
    pub(crate) fn password(&mut self, path: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(password) if password.chars().count() >= MIN_PASSWORD_LENGTH => Some(password),
            Some(password) if !password.is_empty() => {
                self.issue(
                    path,
                    &format!("Password must have at least {MIN_PASSWORD_LENGTH} characters"),
                );
                None
            }
            _ => {
                self.issue(path, "Password is required");
                None
            }
        }
    }

    /// Return `value` if no issue was found, otherwise every issue.
    ///
    /// `value` should be `None` exactly when a field check failed.
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        if !self.issues.is_empty() {
            return Err(ValidationErrors(self.issues));
        }

        value.ok_or_else(|| ValidationErrors::single("", "Invalid input"))
    }
}
