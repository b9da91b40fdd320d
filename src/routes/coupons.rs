use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::coupons::ValidateCouponRequest,
    error::AppResult,
    middleware::{auth::AuthUser, json::ValidJson},
    models::Coupon,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_coupon))
        .route("/validate", post(validate_coupon))
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    responses(
        (status = 200, description = "Active coupon of the caller, or null", body = Coupon),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Option<Coupon>>> {
    let coupon = coupon_service::get_my_coupon(&state, &user).await?;
    Ok(Json(coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon is valid", body = Coupon),
        (status = 400, description = "Coupon code is required"),
        (status = 404, description = "Coupon not found or expired"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<ValidateCouponRequest>,
) -> AppResult<Json<Coupon>> {
    let coupon = coupon_service::validate_coupon(&state, &user, payload).await?;
    Ok(Json(coupon))
}
