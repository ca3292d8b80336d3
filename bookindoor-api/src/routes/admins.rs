use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookindoor_catalog::AdminProfile;
use bookindoor_core::admin::{Admin, AdminUpdate, NewAdmin};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::Caller;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admins", get(list_admins).post(create_admin))
        .route(
            "/v1/admins/{id}",
            get(get_admin).put(update_admin).delete(delete_admin),
        )
}

async fn list_admins(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<Admin>>, AppError> {
    Ok(Json(state.admins.list_admins(&caller).await?))
}

async fn create_admin(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(new): ApiJson<NewAdmin>,
) -> Result<(StatusCode, Json<Admin>), AppError> {
    let admin = state.admins.create_admin(&caller, new).await?;
    info!("Admin {} created", admin.id);
    Ok((StatusCode::CREATED, Json(admin)))
}

async fn get_admin(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminProfile>, AppError> {
    Ok(Json(state.admins.get_profile(&caller, id).await?))
}

async fn update_admin(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<AdminUpdate>,
) -> Result<Json<Admin>, AppError> {
    Ok(Json(state.admins.update_admin(&caller, id, update).await?))
}

async fn delete_admin(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.admins.delete_admin(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
