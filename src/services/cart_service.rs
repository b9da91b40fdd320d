use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, RemoveFromCartRequest, UpdateQuantityRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartLine, CartProduct, Product},
    state::AppState,
};

/// The caller's cart, joined with current product data. Lines whose product
/// has disappeared are skipped.
pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<Vec<CartProduct>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|product| CartProduct {
                product: product_from_entity(product),
                quantity: item.quantity,
            })
        })
        .collect())
}

/// Increment the line for the product, or append it with quantity 1.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<Vec<CartLine>> {
    let product_id = payload.product_id;
    if Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Product not found".into()));
    }

    // Concurrent first adds of a product converge on the same line.
    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product_id),
        quantity: Set(1),
        created_at: NotSet,
    };
    CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::ProductId])
                .value(
                    CartCol::Quantity,
                    Expr::col((CartItems, CartCol::Quantity)).add(1),
                )
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    audit(
        state,
        user,
        "cart_add",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    list_lines(&state.orm, user.user_id).await
}

/// Set the quantity of an existing line. Zero or negative quantities are
/// rejected; callers that mean "remove" must call [`remove_from_cart`].
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<Vec<CartLine>> {
    let quantity = validate_quantity(payload.quantity)?;

    let result = CartItems::update_many()
        .col_expr(CartCol::Quantity, SimpleExpr::Value(quantity.into()))
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    audit(
        state,
        user,
        "cart_update",
        serde_json::json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await;

    list_lines(&state.orm, user.user_id).await
}

/// Remove one line, or every line when no product id is given. Removing a
/// product that is not in the cart is not an error.
pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveFromCartRequest,
) -> AppResult<Vec<CartLine>> {
    let mut delete = CartItems::delete_many().filter(CartCol::UserId.eq(user.user_id));
    if let Some(product_id) = payload.product_id {
        delete = delete.filter(CartCol::ProductId.eq(product_id));
    }
    let result = delete.exec(&state.orm).await?;

    tracing::debug!(
        user_id = %user.user_id,
        removed = result.rows_affected,
        "cart lines removed"
    );

    audit(
        state,
        user,
        "cart_remove",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    list_lines(&state.orm, user.user_id).await
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<()> {
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    audit(
        state,
        user,
        "cart_clear",
        serde_json::json!({ "cleared_at": Utc::now() }),
    )
    .await;

    Ok(())
}

pub fn validate_quantity(quantity: i32) -> AppResult<i32> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(quantity)
}

async fn list_lines<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(line_from_entity)
        .collect();
    Ok(lines)
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, metadata: serde_json::Value) {
    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        action,
        Some("cart_items"),
        Some(metadata),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

fn line_from_entity(model: CartModel) -> CartLine {
    CartLine {
        product_id: model.product_id,
        quantity: model.quantity,
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image: model.image,
    }
}
