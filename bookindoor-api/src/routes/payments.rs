use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use bookindoor_booking::ReconcileOutcome;
use bookindoor_core::payment::{GatewayNotification, PaymentRequest};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiForm;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/{booking_id}/request", get(payment_request))
        .route("/v1/payments/notify", post(notify))
}

async fn payment_request(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PaymentRequest>, AppError> {
    Ok(Json(state.payments.prepare(booking_id).await?))
}

/// Server-to-server callback from the gateway. Anything it should not retry
/// answers `OK`; a bad signature is a 400.
async fn notify(
    State(state): State<AppState>,
    ApiForm(notification): ApiForm<GatewayNotification>,
) -> Result<&'static str, AppError> {
    match state.reconciler.handle_notification(&notification).await? {
        ReconcileOutcome::Advanced { booking_id, status } => {
            info!("Payment notification moved booking {} to {}", booking_id, status);
        }
        ReconcileOutcome::Unchanged { booking_id, reason } => {
            debug!("Payment notification left booking {} unchanged: {:?}", booking_id, reason);
        }
    }
    Ok("OK")
}
