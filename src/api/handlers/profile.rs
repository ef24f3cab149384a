//! Profile handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ProfileRequest, ProfileWithBalance, UpdateProfileRequest, parse_wallet};
use crate::app_state::AppState;
use crate::domain::Profile;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /profiles`: Create a profile.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] if the wallet already has a profile.
#[utoipa::path(
    post,
    path = "/api/v1/profiles",
    tag = "Profiles",
    summary = "Create profile",
    request_body = ProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = Profile),
        (status = 400, description = "Invalid wallet address", body = ErrorResponse),
        (status = 409, description = "Profile already exists", body = ErrorResponse),
    )
)]
pub async fn create_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = parse_wallet("wallet_address", &req.wallet_address)?;
    let profile = state.profile_service.create(&wallet, &req.patch()).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /profiles/{wallet}`: Profile with live token balance.
///
/// # Errors
///
/// Returns [`GatewayError::ProfileNotFound`] if the wallet has no profile.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{wallet}",
    tag = "Profiles",
    summary = "Get profile",
    description = "Returns the profile and the wallet's token balance. The balance is \"0\" when the token contract cannot be read.",
    params(
        ("wallet" = String, Path, description = "Wallet address"),
    ),
    responses(
        (status = 200, description = "Profile", body = ProfileWithBalance),
        (status = 404, description = "Profile not found", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = parse_wallet("wallet", &wallet)?;
    let (profile, balance) = state.profile_service.get_with_balance(&wallet).await?;
    Ok(Json(ProfileWithBalance { profile, balance }))
}

/// `PUT /profiles/{wallet}`: Partial profile update.
///
/// # Errors
///
/// Returns [`GatewayError::ProfileNotFound`] if the wallet has no profile.
#[utoipa::path(
    put,
    path = "/api/v1/profiles/{wallet}",
    tag = "Profiles",
    summary = "Update profile",
    params(
        ("wallet" = String, Path, description = "Wallet address"),
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 404, description = "Profile not found", body = ErrorResponse),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = parse_wallet("wallet", &wallet)?;
    let profile = state.profile_service.update(&wallet, &req.patch()).await?;
    Ok(Json(profile))
}

/// `POST /profiles/upsert`: Create or update a profile.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an invalid wallet.
#[utoipa::path(
    post,
    path = "/api/v1/profiles/upsert",
    tag = "Profiles",
    summary = "Upsert profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Stored profile", body = Profile),
        (status = 400, description = "Invalid wallet address", body = ErrorResponse),
    )
)]
pub async fn upsert_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = parse_wallet("wallet_address", &req.wallet_address)?;
    let profile = state.profile_service.upsert(&wallet, &req.patch()).await?;
    Ok(Json(profile))
}

/// Profile routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", post(create_profile))
        .route("/profiles/upsert", post(upsert_profile))
        .route("/profiles/{wallet}", get(get_profile).put(update_profile))
}
