//! Dashboard HTTP handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};

use crate::{
    AppState, Error,
    models::{AccessToken, DashboardData},
    queries::TransactionQueries,
    validation::TransactionQuery,
};

/// The state needed for displaying the dashboard.
#[derive(Clone)]
pub struct DashboardState {
    /// Reads the signed in user's transactions.
    pub transactions: Arc<dyn TransactionQueries>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transactions: state.queries.transactions.clone(),
        }
    }
}

/// A route handler for the dashboard totals and monthly series.
///
/// Accepts the query parameters `from` and `to` (inclusive dates). Every
/// transaction is included when they are left out. The `type` parameter is
/// ignored, the dashboard always covers both credits and debits.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<DashboardData>, Error> {
    let filter = TransactionQuery {
        kind: None,
        ..query
    }
    .parse()?;

    let transactions = state.transactions.list(&token, &filter).await?;
    tracing::debug!("Summarising {} transactions", transactions.len());

    Ok(Json(DashboardData::from_transactions(&transactions)))
}
