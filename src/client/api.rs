use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    client::error::ClientError,
    dto::{
        cart::{AddToCartRequest, RemoveFromCartRequest, UpdateQuantityRequest},
        coupons::ValidateCouponRequest,
    },
    models::{CartLine, CartProduct, Coupon},
};

/// The cart and coupon endpoints as seen from the storefront.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn get_cart(&self) -> Result<Vec<CartProduct>, ClientError>;
    async fn add_to_cart(&self, product_id: Uuid) -> Result<Vec<CartLine>, ClientError>;
    async fn remove_from_cart(&self, product_id: Uuid) -> Result<Vec<CartLine>, ClientError>;
    async fn update_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<CartLine>, ClientError>;
    async fn clear_cart(&self) -> Result<(), ClientError>;
    async fn get_coupon(&self) -> Result<Option<Coupon>, ClientError>;
    async fn validate_coupon(&self, code: String) -> Result<Coupon, ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`CartApi`] over HTTP. `base_url` points at the `/api` prefix of the server.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCartApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response.json::<ErrorBody>().await.ok().map(|b| b.message);
        tracing::debug!(%status, ?message, "cart api request failed");
        Err(ClientError::from_status(status, message))
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn get_cart(&self) -> Result<Vec<CartProduct>, ClientError> {
        self.send(self.client.get(self.url("/cart"))).await
    }

    async fn add_to_cart(&self, product_id: Uuid) -> Result<Vec<CartLine>, ClientError> {
        let body = AddToCartRequest { product_id };
        self.send(self.client.post(self.url("/cart")).json(&body))
            .await
    }

    async fn remove_from_cart(&self, product_id: Uuid) -> Result<Vec<CartLine>, ClientError> {
        let body = RemoveFromCartRequest {
            product_id: Some(product_id),
        };
        self.send(self.client.delete(self.url("/cart")).json(&body))
            .await
    }

    async fn update_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<CartLine>, ClientError> {
        let body = UpdateQuantityRequest { quantity };
        self.send(
            self.client
                .put(self.url(&format!("/cart/{product_id}")))
                .json(&body),
        )
        .await
    }

    async fn clear_cart(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .send(self.client.post(self.url("/cart/clear-cart")))
            .await?;
        Ok(())
    }

    async fn get_coupon(&self) -> Result<Option<Coupon>, ClientError> {
        self.send(self.client.get(self.url("/coupons"))).await
    }

    async fn validate_coupon(&self, code: String) -> Result<Coupon, ClientError> {
        let body = ValidateCouponRequest { code };
        self.send(self.client.post(self.url("/coupons/validate")).json(&body))
            .await
    }
}
