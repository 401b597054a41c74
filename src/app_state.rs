//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{AttachmentService, AuthService, Queries, StorageService};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The backend query groups.
    pub queries: Queries,

    /// Signs users up, in and out.
    pub auth: AuthService,

    /// Stores files attached to transactions.
    pub attachments: AttachmentService,

    /// Where password recovery links should send the user, e.g. the web app's
    /// reset password page. The backend's default is used if this is `None`.
    pub password_reset_redirect_url: Option<String>,
}

impl AppState {
    /// Create a new [AppState] that serves `queries` and stores attachments
    /// with `storage`.
    pub fn new(
        cookie_secret: &str,
        queries: Queries,
        storage: StorageService,
        password_reset_redirect_url: Option<String>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            auth: AuthService::new(queries.auth.clone()),
            attachments: AttachmentService::new(storage, queries.transactions.clone()),
            queries,
            password_reset_redirect_url,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
