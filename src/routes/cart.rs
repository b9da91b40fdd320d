use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, RemoveFromCartRequest, UpdateQuantityRequest},
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, json::ValidJson},
    models::{CartLine, CartProduct},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_cart).post(add_to_cart).delete(remove_from_cart),
        )
        .route("/clear-cart", post(clear_cart))
        .route("/{id}", put(update_quantity))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with current product data", body = Vec<CartProduct>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<CartProduct>>> {
    let cart = cart_service::get_cart(&state, &user).await?;
    Ok(Json(cart))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Product added, or its quantity incremented", body = Vec<CartLine>),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Product not found"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<AddToCartRequest>,
) -> AppResult<Json<Vec<CartLine>>> {
    let lines = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(lines))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    request_body = RemoveFromCartRequest,
    responses(
        (status = 200, description = "Line removed, or the whole cart when no product id is sent", body = Vec<CartLine>),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> AppResult<Json<Vec<CartLine>>> {
    let payload = parse_remove_body(&body)?;
    let lines = cart_service::remove_from_cart(&state, &user, payload).await?;
    Ok(Json(lines))
}

#[utoipa::path(
    put,
    path = "/api/cart/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = Vec<CartLine>),
        (status = 400, description = "Quantity must be greater than 0"),
        (status = 404, description = "Product not in cart"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateQuantityRequest>,
) -> AppResult<Json<Vec<CartLine>>> {
    let lines = cart_service::update_quantity(&state, &user, id, payload).await?;
    Ok(Json(lines))
}

#[utoipa::path(
    post,
    path = "/api/cart/clear-cart",
    responses(
        (status = 200, description = "Cart emptied", body = serde_json::Value),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<serde_json::Value>> {
    cart_service::clear_cart(&state, &user).await?;
    Ok(Json(serde_json::json!({})))
}

// DELETE bodies are optional; an empty body means "remove everything".
fn parse_remove_body(body: &[u8]) -> AppResult<RemoveFromCartRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RemoveFromCartRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid body: {e}")))
}
