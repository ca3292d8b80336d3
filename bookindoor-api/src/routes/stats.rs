use axum::{extract::State, routing::get, Json, Router};
use bookindoor_booking::StatsReport;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiQuery;
use crate::middleware::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub venue: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/stats", get(stats))
}

async fn stats(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<StatsReport>, AppError> {
    Ok(Json(state.stats.report(&caller, query.venue).await?))
}
