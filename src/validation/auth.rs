//! Schemas for the sign up, sign in, forgot password and account forms.

use serde::Deserialize;

use crate::{
    models::{SignInCredentials, SignUpCredentials, UserChanges},
    validation::{ValidationErrors, Validator, refine_fields_match},
};

/// The minimum number of characters a new password must have.
///
/// The backend may apply a stricter policy on top of this.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";

/// The sign in form.
#[derive(Clone, Default, Deserialize)]
pub struct SignInPayload {
    /// The email the user signed up with.
    #[serde(default)]
    pub email: Option<String>,
    /// The user's password.
    #[serde(default)]
    pub password: Option<String>,
}

impl SignInPayload {
    /// Validate the sign in form.
    pub fn parse(self) -> Result<SignInCredentials, ValidationErrors> {
        let mut validator = Validator::new();
        let email = validator.email("email", self.email);
        let password = match self.password {
            Some(password) if !password.is_empty() => Some(password),
            _ => {
                validator.issue("password", "Password is required");
                None
            }
        };

        let credentials = match (email, password) {
            (Some(email), Some(password)) => Some(SignInCredentials { email, password }),
            _ => None,
        };

        validator.finish(credentials)
    }
}

/// The sign up form.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    /// The name to display for the user.
    #[serde(default)]
    pub name: Option<String>,
    /// The email to sign in with.
    #[serde(default)]
    pub email: Option<String>,
    /// The new password.
    #[serde(default)]
    pub password: Option<String>,
    /// The new password again, must equal `password`.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl SignUpPayload {
    /// Validate the sign up form.
    pub fn parse(self) -> Result<SignUpCredentials, ValidationErrors> {
        let mut validator = Validator::new();
        let name = validator.non_empty("name", self.name, "Name is required");
        let email = validator.email("email", self.email);
        let password = validator.password("password", self.password);

        if let Some(password) = &password {
            validator.refine(refine_fields_match(
                password.as_str(),
                self.confirm_password.as_deref().unwrap_or_default(),
                "confirmPassword",
                PASSWORDS_DO_NOT_MATCH,
            ));
        }

        let credentials = match (name, email, password) {
            (Some(name), Some(email), Some(password)) => Some(SignUpCredentials {
                name,
                email,
                password,
            }),
            _ => None,
        };

        validator.finish(credentials)
    }
}

/// The forgot password form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordPayload {
    /// Where to send the recovery link.
    #[serde(default)]
    pub email: Option<String>,
}

impl ForgotPasswordPayload {
    /// Validate the forgot password form, returning the email.
    pub fn parse(self) -> Result<String, ValidationErrors> {
        let mut validator = Validator::new();
        let email = validator.email("email", self.email);

        validator.finish(email)
    }
}

/// The account form. Fields that are left out are not changed.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    /// A new display name.
    #[serde(default)]
    pub name: Option<String>,
    /// A new email.
    #[serde(default)]
    pub email: Option<String>,
    /// A new password.
    #[serde(default)]
    pub password: Option<String>,
    /// The new password again, required with `password`.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl UpdateUserPayload {
    /// Validate the account form.
    pub fn parse(self) -> Result<UserChanges, ValidationErrors> {
        let mut validator = Validator::new();

        if self.name.is_none() && self.email.is_none() && self.password.is_none() {
            validator.issue("", "Nothing to update");
        }

        let name = self
            .name
            .and_then(|name| validator.non_empty("name", Some(name), "Name cannot be empty"));
        let email = self
            .email
            .and_then(|email| validator.email("email", Some(email)));
        let password = self
            .password
            .and_then(|password| validator.password("password", Some(password)));

        if let Some(password) = &password {
            validator.refine(refine_fields_match(
                password.as_str(),
                self.confirm_password.as_deref().unwrap_or_default(),
                "confirmPassword",
                PASSWORDS_DO_NOT_MATCH,
            ));
        }

        validator.finish(Some(UserChanges {
            name,
            email,
            password,
        }))
    }
}
