use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    audit::log_audit,
    dto::coupons::ValidateCouponRequest,
    entity::coupons::{ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons, Model as CouponModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Coupon,
    state::AppState,
};

/// The caller's active coupon, if they have one.
pub async fn get_my_coupon(state: &AppState, user: &AuthUser) -> AppResult<Option<Coupon>> {
    let coupon = Coupons::find()
        .filter(CouponCol::UserId.eq(user.user_id))
        .filter(CouponCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;

    Ok(coupon.map(coupon_from_entity))
}

/// Look up an active coupon owned by the caller. An expired coupon is
/// deactivated on the spot and reported as not found.
pub async fn validate_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: ValidateCouponRequest,
) -> AppResult<Coupon> {
    let code = normalize_code(&payload.code)?;

    let model = Coupons::find()
        .filter(CouponCol::Code.eq(code.as_str()))
        .filter(CouponCol::UserId.eq(user.user_id))
        .filter(CouponCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".into()))?;

    let coupon = coupon_from_entity(model.clone());
    if coupon.is_expired_at(Utc::now()) {
        let mut active: CouponActive = model.into();
        active.is_active = Set(false);
        active.update(&state.orm).await?;
        tracing::info!(user_id = %user.user_id, code = %coupon.code, "coupon expired");
        return Err(AppError::NotFound("Coupon expired".into()));
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "coupon_validate",
        Some("coupons"),
        Some(serde_json::json!({ "code": coupon.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(coupon)
}

fn normalize_code(code: &str) -> AppResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".into()));
    }
    Ok(code.to_string())
}

fn coupon_from_entity(model: CouponModel) -> Coupon {
    Coupon {
        code: model.code,
        discount_percentage: model.discount_percentage,
        expires_at: model.expires_at.with_timezone(&Utc),
        is_active: model.is_active,
        user_id: model.user_id,
    }
}
