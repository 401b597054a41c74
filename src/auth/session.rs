//! Finding the session token on an incoming request.
//!
//! The mobile app sends `Authorization: Bearer <token>`, the web app relies on
//! the private session cookie. The header wins when both are present.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    extract::{PrivateCookieJar, cookie::Key},
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, Error, auth::cookie::get_token_from_cookies, models::AccessToken};

/// The state needed to read session cookies.
#[derive(Clone)]
pub struct AuthState {
    /// The key used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

async fn find_access_token<S>(parts: &mut Parts, state: &S) -> Option<AccessToken>
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    match parts
        .extract::<Option<TypedHeader<Authorization<Bearer>>>>()
        .await
    {
        Ok(Some(TypedHeader(Authorization(bearer)))) => {
            return Some(AccessToken::new(bearer.token()));
        }
        Ok(None) => {}
        Err(error) => tracing::debug!("Ignoring malformed authorization header: {error}"),
    }

    let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(never) => match never {},
    };

    get_token_from_cookies(&jar)
}

/// The session token of the request, if it has one.
///
/// Use this on routes that behave differently for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<AccessToken>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(find_access_token(parts, state).await))
    }
}

/// Middleware that rejects requests without a session token with a 401.
///
/// The token is placed into the request, route handlers can use the function
/// argument `Extension(token): Extension<AccessToken>` to receive it. The
/// token is not checked here, the backend rejects tokens that are not valid.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let Some(token) = find_access_token(&mut parts, &state).await else {
        tracing::debug!("Rejecting request to {} without a session", parts.uri.path());
        return Error::Unauthenticated.into_response();
    };

    parts.extensions.insert(token);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
