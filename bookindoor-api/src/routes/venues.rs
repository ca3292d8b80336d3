use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookindoor_booking::{Booking, DayAvailability};
use bookindoor_catalog::{NewVenue, Venue, VenueUpdate, VenueView};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::{Caller, MaybeCaller};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub sport: String,
    pub date: NaiveDate,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/venues", get(list_venues).post(create_venue))
        .route(
            "/v1/venues/{id}",
            get(get_venue).put(update_venue).delete(delete_venue),
        )
        .route("/v1/venues/{id}/availability", get(availability))
        .route("/v1/venues/{id}/bookings", get(venue_bookings))
}

async fn list_venues(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
) -> Result<Json<Vec<VenueView>>, AppError> {
    Ok(Json(state.venues.list_venues(caller.as_ref()).await?))
}

async fn create_venue(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(new): ApiJson<NewVenue>,
) -> Result<(StatusCode, Json<Venue>), AppError> {
    let venue = state.venues.create_venue(&caller, new).await?;
    info!("Venue {} created by {}", venue.id, caller.id);
    Ok((StatusCode::CREATED, Json(venue)))
}

async fn get_venue(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Path(id): Path<Uuid>,
) -> Result<Json<VenueView>, AppError> {
    Ok(Json(state.venues.get_venue(id, caller.as_ref()).await?))
}

async fn update_venue(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<VenueUpdate>,
) -> Result<Json<Venue>, AppError> {
    Ok(Json(state.venues.update_venue(&caller, id, update).await?))
}

async fn delete_venue(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.venues.delete_venue(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<Json<DayAvailability>, AppError> {
    let day = state
        .availability
        .day_availability(id, &query.sport, query.date, state.pricing.slot_minutes)
        .await?;
    Ok(Json(day))
}

async fn venue_bookings(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.writer.bookings_for_venue(&caller, id).await?))
}
