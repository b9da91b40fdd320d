use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, RemoveFromCartRequest, UpdateQuantityRequest},
        coupons::ValidateCouponRequest,
    },
    models::{CartLine, CartProduct, Coupon, Product},
    response::ApiResponse,
    routes::{cart, coupons, health},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::update_quantity,
        cart::clear_cart,
        coupons::get_coupon,
        coupons::validate_coupon
    ),
    components(
        schemas(
            Product,
            CartLine,
            CartProduct,
            Coupon,
            AddToCartRequest,
            RemoveFromCartRequest,
            UpdateQuantityRequest,
            ValidateCouponRequest,
            health::HealthData,
            ApiResponse<health::HealthData>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Coupons", description = "Coupon endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
