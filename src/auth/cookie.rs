//! Defines functions for keeping the session token in a private cookie.
//!
//! The web app signs in through the API, so the token is stored in an
//! encrypted, HTTP only cookie that the browser sends back automatically.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::models::{AccessToken, Session};

pub(crate) const COOKIE_SESSION: &str = "session";

/// Add the session cookie to the cookie jar. It expires with the session.
pub(crate) fn set_session_cookie(jar: PrivateCookieJar, session: &Session) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, session.access_token.as_str().to_owned()))
            .expires(session.expires_at)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// The session token in `jar`, if there is a usable one.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Option<AccessToken> {
    jar.get(COOKIE_SESSION)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .filter(|token| !token.is_empty() && token != "deleted")
        .map(|token| AccessToken::new(&token))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::models::{AccessToken, Session, User};

    use super::{
        COOKIE_SESSION, get_token_from_cookies, invalidate_session_cookie, set_session_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    fn session() -> Session {
        Session {
            access_token: AccessToken::new("jwt"),
            expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
            user: User {
                id: "7f1c".to_owned(),
                email: "ana@example.com".to_owned(),
                name: None,
            },
        }
    }

    #[test]
    fn can_set_cookie() {
        let session = session();

        let jar = set_session_cookie(get_jar(), &session);
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(cookie.value(), "jwt");
        assert_eq!(cookie.expires_datetime(), Some(session.expires_at));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn can_read_token_back() {
        let jar = set_session_cookie(get_jar(), &session());

        assert_eq!(get_token_from_cookies(&jar), Some(AccessToken::new("jwt")));
    }

    #[test]
    fn invalidated_cookie_has_no_token() {
        let jar = set_session_cookie(get_jar(), &session());

        let jar = invalidate_session_cookie(jar);
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH)
        );
        assert_eq!(get_token_from_cookies(&jar), None);
    }

    #[test]
    fn empty_jar_has_no_token() {
        assert_eq!(get_token_from_cookies(&get_jar()), None);
    }
}
