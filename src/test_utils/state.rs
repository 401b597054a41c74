//! An app state backed by an in-memory database and a temporary directory.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use uuid::Uuid;

use crate::{
    AppState, LocalBackend, LocalStorage, Queries, StorageService,
    db::initialize,
    models::{Session, SignUpCredentials},
};

/// A password that passes every strength check.
pub(crate) const TEST_PASSWORD: &str = "correct horse battery staple";

/// An app state whose attachments directory is deleted on drop.
pub(crate) struct TestApp {
    pub state: AppState,
    pub storage_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        // The directory only exists once something was uploaded.
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

/// Create an app state that uses the local backend.
///
/// Passwords are hashed with the lowest bcrypt cost to keep tests fast.
pub(crate) fn test_app() -> TestApp {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");
    let backend = LocalBackend::new(Arc::new(Mutex::new(connection))).with_password_cost(4);

    let storage_dir = std::env::temp_dir().join(format!("bytebank-test-{}", Uuid::new_v4()));
    let storage = StorageService::new(Arc::new(LocalStorage::new(&storage_dir)), "attachments");

    let state = AppState::new(
        "foobar",
        Queries::local(backend),
        storage,
        Some("http://localhost:5173/reset-password".to_owned()),
    );

    TestApp { state, storage_dir }
}

/// Sign up "test@example.com" with [TEST_PASSWORD] and return the session.
pub(crate) async fn sign_up_test_user(state: &AppState) -> Session {
    state
        .auth
        .sign_up(&SignUpCredentials {
            name: "Test User".to_owned(),
            email: "test@example.com".to_owned(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await
        .expect("Could not sign up test user.")
        .session
        .expect("The local backend should sign new users in.")
}
