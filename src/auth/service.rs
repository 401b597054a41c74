//! The entry point for everything to do with users and sessions.

use std::sync::Arc;

use crate::{
    Error,
    models::{
        AccessToken, Session, SignInCredentials, SignUpCredentials, SignUpOutcome, User,
        UserChanges,
    },
    queries::AuthQueries,
};

/// Signs users up, in and out, on top of an [AuthQueries] implementation.
#[derive(Clone)]
pub struct AuthService {
    queries: Arc<dyn AuthQueries>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create a service that uses `queries` to talk to the auth backend.
    pub fn new(queries: Arc<dyn AuthQueries>) -> Self {
        Self { queries }
    }

    /// Get the user for the session identified by `token`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] ("user not found") if there is no session or
    /// the session does not belong to a user. Other backend errors are passed on.
    pub async fn get_current_user(&self, token: Option<&AccessToken>) -> Result<User, Error> {
        let Some(token) = token else {
            return Err(Error::NotFound("user"));
        };

        self.queries
            .get_current_user(token)
            .await?
            .ok_or(Error::NotFound("user"))
    }

    /// Create a new account.
    pub async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome, Error> {
        self.queries.sign_up(credentials).await
    }

    /// Start a session with an email and password.
    pub async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<Session, Error> {
        self.queries.sign_in_with_password(credentials).await
    }

    /// End the session identified by `token`.
    pub async fn sign_out(&self, token: &AccessToken) -> Result<(), Error> {
        self.queries.sign_out(token).await
    }

    /// Ask the backend to send a password recovery link to `email`.
    pub async fn forgot_password(&self, email: &str, redirect_to: Option<&str>) -> Result<(), Error> {
        self.queries.forgot_password(email, redirect_to).await
    }

    /// Apply `changes` to the user that owns `token`.
    pub async fn update_user(
        &self,
        token: &AccessToken,
        changes: &UserChanges,
    ) -> Result<User, Error> {
        self.queries.update_user(token, changes).await
    }
}

#[cfg(test)]
mod auth_service_tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use time::OffsetDateTime;

    use crate::{
        Error, handle_response_error,
        models::{
            AccessToken, Session, SignInCredentials, SignUpCredentials, SignUpOutcome, User,
            UserChanges,
        },
        queries::AuthQueries,
    };

    use super::AuthService;

    /// Answers every query with a canned result and records the calls it got.
    struct FakeAuth {
        current_user: Option<User>,
        backend_down: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeAuth {
        fn new(current_user: Option<User>) -> Self {
            Self {
                current_user,
                backend_down: false,
                calls: Mutex::default(),
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn ana() -> User {
        User {
            id: "7f1c".to_owned(),
            email: "ana@example.com".to_owned(),
            name: Some("Ana".to_owned()),
        }
    }

    fn session() -> Session {
        Session {
            access_token: AccessToken::new("jwt"),
            expires_at: OffsetDateTime::UNIX_EPOCH,
            user: ana(),
        }
    }

    #[async_trait]
    impl AuthQueries for FakeAuth {
        async fn sign_up(&self, _credentials: &SignUpCredentials) -> Result<SignUpOutcome, Error> {
            self.record("sign_up");
            Ok(SignUpOutcome {
                user: ana(),
                session: None,
            })
        }

        async fn sign_in_with_password(
            &self,
            _credentials: &SignInCredentials,
        ) -> Result<Session, Error> {
            self.record("sign_in_with_password");
            Ok(session())
        }

        async fn sign_out(&self, _token: &AccessToken) -> Result<(), Error> {
            self.record("sign_out");
            Ok(())
        }

        async fn forgot_password(
            &self,
            _email: &str,
            _redirect_to: Option<&str>,
        ) -> Result<(), Error> {
            self.record("forgot_password");
            Ok(())
        }

        async fn update_user(
            &self,
            _token: &AccessToken,
            _changes: &UserChanges,
        ) -> Result<User, Error> {
            self.record("update_user");
            Ok(ana())
        }

        async fn get_current_user(&self, _token: &AccessToken) -> Result<Option<User>, Error> {
            self.record("get_current_user");

            if self.backend_down {
                Err(Error::Backend("connection refused".to_owned()))
            } else {
                Ok(self.current_user.clone())
            }
        }
    }

    #[tokio::test]
    async fn returns_current_user() {
        let service = AuthService::new(Arc::new(FakeAuth::new(Some(ana()))));

        let user = service
            .get_current_user(Some(&AccessToken::new("jwt")))
            .await;

        assert_eq!(user, Ok(ana()));
    }

    #[tokio::test]
    async fn missing_user_is_classified_as_404() {
        let service = AuthService::new(Arc::new(FakeAuth::new(None)));

        let error = service
            .get_current_user(Some(&AccessToken::new("jwt")))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "user not found");
        assert_eq!(handle_response_error(&error).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn no_session_is_classified_as_404() {
        let fake = Arc::new(FakeAuth::new(Some(ana())));
        let service = AuthService::new(fake.clone());

        let error = service.get_current_user(None).await.unwrap_err();

        assert_eq!(error, Error::NotFound("user"));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let service = AuthService::new(Arc::new(FakeAuth {
            backend_down: true,
            ..FakeAuth::new(Some(ana()))
        }));

        let error = service
            .get_current_user(Some(&AccessToken::new("jwt")))
            .await
            .unwrap_err();

        assert_eq!(
            handle_response_error(&error).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn other_operations_delegate() {
        let fake = Arc::new(FakeAuth::new(None));
        let service = AuthService::new(fake.clone());
        let token = AccessToken::new("jwt");

        service
            .sign_up(&SignUpCredentials {
                name: "Ana".to_owned(),
                email: "ana@example.com".to_owned(),
                password: "correct horse".to_owned(),
            })
            .await
            .unwrap();
        service
            .sign_in_with_password(&SignInCredentials {
                email: "ana@example.com".to_owned(),
                password: "correct horse".to_owned(),
            })
            .await
            .unwrap();
        service.forgot_password("ana@example.com", None).await.unwrap();
        service
            .update_user(&token, &UserChanges::default())
            .await
            .unwrap();
        service.sign_out(&token).await.unwrap();

        assert_eq!(
            *fake.calls.lock().unwrap(),
            [
                "sign_up",
                "sign_in_with_password",
                "forgot_password",
                "update_user",
                "sign_out"
            ]
        );
    }
}
