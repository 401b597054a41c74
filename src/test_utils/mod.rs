#![allow(missing_docs)]

pub(crate) mod http;
pub(crate) mod state;

pub(crate) use http::{assert_content_type, body_text, spawn_test_backend};
pub(crate) use state::{TEST_PASSWORD, TestApp, sign_up_test_user, test_app};
