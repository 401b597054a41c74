//! Signing users up, in and out, and finding the session on a request.
//!
//! Users and sessions live in the auth backend. This module keeps the session
//! token in a private cookie for the web app and accepts a bearer token from
//! the mobile app.

mod cookie;
mod handlers;
mod password;
mod service;
mod session;

pub use handlers::{
    get_current_user, patch_current_user, post_forgot_password, post_sign_in, post_sign_out,
    post_sign_up,
};
pub use password::{PasswordHash, ValidatedPassword};
pub use service::AuthService;
pub use session::{AuthState, auth_guard};
