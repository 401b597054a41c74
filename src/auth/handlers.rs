//! Route handlers for signing in and out, signing up, password recovery and
//! the current user.

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde_json::{Value, json};

use crate::{
    AppState, AuthService, Error,
    auth::{
        cookie::{invalidate_session_cookie, set_session_cookie},
        session::MaybeSession,
    },
    models::{Session, SignUpOutcome, User},
    payload::Payload,
    validation::{ForgotPasswordPayload, SignInPayload, SignUpPayload, UpdateUserPayload},
};

/// The state needed by the auth routes.
#[derive(Debug, Clone)]
pub struct AuthRouteState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// Talks to the auth backend.
    pub auth: AuthService,
    /// Where password recovery links should send the user.
    pub password_reset_redirect_url: Option<String>,
}

impl FromRef<AppState> for AuthRouteState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            auth: state.auth.clone(),
            password_reset_redirect_url: state.password_reset_redirect_url.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthRouteState> for Key {
    fn from_ref(state: &AuthRouteState) -> Self {
        state.cookie_key.clone()
    }
}

/// A route handler for signing in with an email and password.
///
/// On success the session cookie is set and the session is returned, so that
/// clients without cookies can use the access token as a bearer token.
pub async fn post_sign_in(
    State(state): State<AuthRouteState>,
    jar: PrivateCookieJar,
    Payload(payload): Payload<SignInPayload>,
) -> Result<(PrivateCookieJar, Json<Session>), Error> {
    let credentials = payload.parse()?;
    let session = state.auth.sign_in_with_password(&credentials).await?;

    tracing::info!("User {} signed in", session.user.id);

    Ok((set_session_cookie(jar, &session), Json(session)))
}

/// A route handler for creating a new account.
///
/// The session cookie is only set if the backend signed the new user in, i.e.
/// it does not require the email to be confirmed first.
pub async fn post_sign_up(
    State(state): State<AuthRouteState>,
    jar: PrivateCookieJar,
    Payload(payload): Payload<SignUpPayload>,
) -> Result<(PrivateCookieJar, Json<SignUpOutcome>), Error> {
    let credentials = payload.parse()?;
    let outcome = state.auth.sign_up(&credentials).await?;

    let jar = match &outcome.session {
        Some(session) => set_session_cookie(jar, session),
        None => {
            tracing::info!("User {} must confirm their email", outcome.user.id);
            jar
        }
    };

    Ok((jar, Json(outcome)))
}

/// A route handler for ending the current session.
///
/// The session cookie is always cleared. A session the backend no longer
/// accepts counts as signed out.
pub async fn post_sign_out(
    State(state): State<AuthRouteState>,
    MaybeSession(token): MaybeSession,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    if let Some(token) = token {
        match state.auth.sign_out(&token).await {
            Ok(()) => {}
            Err(Error::Unauthenticated) => {}
            Err(Error::Http { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {}
            Err(error) => return Err(error),
        }
    }

    Ok((invalidate_session_cookie(jar), Json(json!({}))))
}

/// A route handler for requesting a password recovery email.
///
/// Responds the same way whether or not the email belongs to a user.
pub async fn post_forgot_password(
    State(state): State<AuthRouteState>,
    Payload(payload): Payload<ForgotPasswordPayload>,
) -> Result<Json<Value>, Error> {
    let email = payload.parse()?;

    state
        .auth
        .forgot_password(&email, state.password_reset_redirect_url.as_deref())
        .await?;

    Ok(Json(json!({})))
}

/// A route handler for getting the signed in user.
pub async fn get_current_user(
    State(state): State<AuthRouteState>,
    MaybeSession(token): MaybeSession,
) -> Result<Json<User>, Error> {
    state.auth.get_current_user(token.as_ref()).await.map(Json)
}

/// A route handler for changing the signed in user's name, email or password.
///
/// Also accepts the token from a password recovery link, which is how a
/// forgotten password is reset.
pub async fn patch_current_user(
    State(state): State<AuthRouteState>,
    MaybeSession(token): MaybeSession,
    Payload(payload): Payload<UpdateUserPayload>,
) -> Result<Json<User>, Error> {
    let token = token.ok_or(Error::Unauthenticated)?;
    let changes = payload.parse()?;

    state.auth.update_user(&token, &changes).await.map(Json)
}
