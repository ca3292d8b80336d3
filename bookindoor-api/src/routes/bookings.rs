use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookindoor_booking::{Booking, BookingRequest};
use bookindoor_core::payment::{PaymentRequest, PaymentStatus};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{Caller, MaybeCaller};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateBookingsResponse {
    pub booking_ids: Vec<Uuid>,
    pub payment_status: PaymentStatus,
    /// One signed checkout payload per created booking, same order as `booking_ids`.
    pub payments: Vec<PaymentRequest>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_bookings))
        .route("/v1/bookings/mine", get(my_bookings))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

async fn create_bookings(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    ApiJson(request): ApiJson<BookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingsResponse>), AppError> {
    // the client's payment mode is kept on the booking, never trusted as a status
    let bookings = state
        .writer
        .place_bookings(request, caller.as_ref(), PaymentStatus::Pending)
        .await?;
    let booking_ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();

    let payments = bookings
        .iter()
        .map(|booking| state.payments.request_for(booking))
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|e| {
            // stored but unsigned; the client can retry via /v1/payments/{id}/request
            warn!("Checkout signing failed for pending bookings {:?}: {}", booking_ids, e);
        })?;

    info!("Booking request accepted: {:?}", booking_ids);
    Ok((
        StatusCode::CREATED,
        Json(CreateBookingsResponse {
            booking_ids,
            payment_status: PaymentStatus::Pending,
            payments,
        }),
    ))
}

async fn my_bookings(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.writer.bookings_for_user(&caller).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.writer.cancel_booking(id, &caller).await?))
}
