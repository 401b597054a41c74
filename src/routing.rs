//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState,
    attachment::{delete_attachment, get_attachment, get_attachments, post_attachment},
    auth::{
        AuthState, auth_guard, get_current_user, patch_current_user, post_forgot_password,
        post_sign_in, post_sign_out, post_sign_up,
    },
    dashboard::get_dashboard,
    endpoints,
    transaction::{
        create_transaction, delete_transaction, get_transaction, get_transactions,
        update_transaction,
    },
};

/// Return a router with all the app's routes.
///
/// Transaction, attachment and dashboard routes need a session, see
/// [auth_guard].
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(
            endpoints::AUTH,
            get(get_current_user)
                .post(post_sign_in)
                .patch(patch_current_user),
        )
        .route(endpoints::SIGN_UP, post(post_sign_up))
        .route(endpoints::SIGN_OUT, post(post_sign_out))
        .route(
            endpoints::FORGOT_PASSWORD,
            post(post_forgot_password),
        );

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions).post(create_transaction),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route(
            endpoints::ATTACHMENTS,
            get(get_attachments).post(post_attachment),
        )
        .route(
            endpoints::ATTACHMENT,
            get(get_attachment).delete(delete_attachment),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route_layer(middleware::from_fn_with_state(
            AuthState {
                cookie_key: state.cookie_key.clone(),
            },
            auth_guard,
        ));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}
