use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    client::{
        api::CartApi,
        error::ClientError,
        notify::Notifier,
        storage::{CART_STORAGE_KEY, COUPON_STORAGE_KEY, SnapshotStore},
        totals::recompute_totals,
    },
    models::{CartProduct, Coupon, Product},
};

const GENERIC_FAILURE: &str = "An error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    pub cart: Vec<CartProduct>,
    pub coupon: Option<Coupon>,
    pub is_coupon_applied: bool,
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// What is written under `coupon-storage`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSnapshot {
    pub coupon: Option<Coupon>,
    pub is_applied: bool,
}

/// A cart change computed ahead of the request that confirms it.
#[derive(Debug)]
#[must_use = "a staged change must be committed or rolled back"]
struct StagedCart {
    tentative: Vec<CartProduct>,
}

impl StagedCart {
    fn add(cart: &[CartProduct], product: &Product) -> Self {
        let mut tentative = cart.to_vec();
        match tentative.iter_mut().find(|line| line.id() == product.id) {
            Some(line) => line.quantity += 1,
            None => tentative.push(CartProduct {
                product: product.clone(),
                quantity: 1,
            }),
        }
        Self { tentative }
    }

    fn commit(self) -> Vec<CartProduct> {
        self.tentative
    }

    fn rollback(self) {
        tracing::debug!(lines = self.tentative.len(), "discarding staged cart");
    }
}

/// Client-side cart view-model.
///
/// Build it once at startup with [`CartStore::load`] and hand it to whatever
/// renders the cart. Every operation talks to the server through `A`, merges
/// the outcome into the local state, recomputes totals and writes the
/// snapshots to `S`. Failures are reported through `N` and returned.
pub struct CartStore<A, S, N> {
    api: A,
    storage: S,
    notifier: N,
    state: CartState,
}

impl<A, S, N> CartStore<A, S, N>
where
    A: CartApi,
    S: SnapshotStore,
    N: Notifier,
{
    /// Restore the persisted snapshots. Missing or unreadable snapshots start
    /// from an empty cart and no coupon.
    pub fn load(api: A, storage: S, notifier: N) -> Self {
        let cart: Vec<CartProduct> = read_snapshot(&storage, CART_STORAGE_KEY);
        let coupon: CouponSnapshot = read_snapshot(&storage, COUPON_STORAGE_KEY);

        let mut store = Self {
            api,
            storage,
            notifier,
            state: CartState {
                cart,
                is_coupon_applied: coupon.is_applied && coupon.coupon.is_some(),
                coupon: coupon.coupon,
                ..CartState::default()
            },
        };
        store.recalculate();
        store
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn cart(&self) -> &[CartProduct] {
        &self.state.cart
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.state.coupon.as_ref()
    }

    pub fn is_coupon_applied(&self) -> bool {
        self.state.is_coupon_applied
    }

    pub fn subtotal(&self) -> Decimal {
        self.state.subtotal
    }

    pub fn total(&self) -> Decimal {
        self.state.total
    }

    /// Replace the local cart with the server's. On failure the cart is
    /// emptied rather than left stale.
    pub async fn get_cart_items(&mut self) -> Result<(), ClientError> {
        match self.api.get_cart().await {
            Ok(cart) => {
                self.state.cart = cart;
                self.recalculate();
                self.persist_cart();
                Ok(())
            }
            Err(err) => {
                self.state.cart.clear();
                self.recalculate();
                self.persist_cart();
                self.report(&err, GENERIC_FAILURE);
                Err(err)
            }
        }
    }

    pub async fn add_to_cart(&mut self, product: &Product) -> Result<(), ClientError> {
        let staged = StagedCart::add(&self.state.cart, product);
        match self.api.add_to_cart(product.id).await {
            Ok(_) => {
                self.notifier.success("Product added to cart");
                self.state.cart = staged.commit();
                self.recalculate();
                self.persist_cart();
                Ok(())
            }
            Err(err) => {
                staged.rollback();
                self.report(&err, GENERIC_FAILURE);
                Err(err)
            }
        }
    }

    pub async fn remove_from_cart(&mut self, product_id: Uuid) -> Result<(), ClientError> {
        match self.api.remove_from_cart(product_id).await {
            Ok(_) => {
                self.state.cart.retain(|line| line.id() != product_id);
                self.recalculate();
                self.persist_cart();
                Ok(())
            }
            Err(err) => {
                self.report(&err, GENERIC_FAILURE);
                Err(err)
            }
        }
    }

    /// Set a line's quantity. Zero removes the line instead of calling the
    /// update endpoint.
    pub async fn update_quantity(
        &mut self,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), ClientError> {
        if quantity == 0 {
            return self.remove_from_cart(product_id).await;
        }

        let quantity = match i32::try_from(quantity) {
            Ok(quantity) => quantity,
            Err(_) => {
                let err = ClientError::InvalidArgument("quantity is too large".into());
                self.report(&err, GENERIC_FAILURE);
                return Err(err);
            }
        };

        match self.api.update_quantity(product_id, quantity).await {
            Ok(_) => {
                if let Some(line) = self
                    .state
                    .cart
                    .iter_mut()
                    .find(|line| line.id() == product_id)
                {
                    line.quantity = quantity;
                }
                self.recalculate();
                self.persist_cart();
                Ok(())
            }
            Err(err) => {
                self.report(&err, GENERIC_FAILURE);
                Err(err)
            }
        }
    }

    /// Empty the cart on the server, then drop the local cart, coupon and
    /// both snapshots.
    pub async fn clear_cart(&mut self) -> Result<(), ClientError> {
        match self.api.clear_cart().await {
            Ok(()) => {
                self.state = CartState::default();
                self.forget(CART_STORAGE_KEY);
                self.forget(COUPON_STORAGE_KEY);
                Ok(())
            }
            Err(err) => {
                self.notifier.error("Failed to clear the cart");
                Err(err)
            }
        }
    }

    /// Load the caller's coupon without applying it. A coupon that was
    /// already applied stays applied only if the server returns the same code.
    pub async fn fetch_coupon(&mut self) -> Result<(), ClientError> {
        match self.api.get_coupon().await {
            Ok(coupon) => {
                let same_code = match (&self.state.coupon, &coupon) {
                    (Some(current), Some(fetched)) => current.code == fetched.code,
                    _ => false,
                };
                self.state.is_coupon_applied &= same_code;
                self.state.coupon = coupon;
                self.recalculate();
                self.persist_coupon();
                Ok(())
            }
            Err(err) => {
                self.report(&err, "Failed to fetch coupon");
                Err(err)
            }
        }
    }

    pub async fn apply_coupon(&mut self, code: &str) -> Result<(), ClientError> {
        match self.api.validate_coupon(code.to_string()).await {
            Ok(coupon) => {
                self.state.coupon = Some(coupon);
                self.state.is_coupon_applied = true;
                self.recalculate();
                self.persist_coupon();
                self.notifier.success("Coupon applied successfully");
                Ok(())
            }
            Err(err) => {
                self.report(&err, "Failed to apply coupon");
                Err(err)
            }
        }
    }

    /// Local only: the coupon stays valid on the server.
    pub fn remove_coupon(&mut self) {
        self.state.coupon = None;
        self.state.is_coupon_applied = false;
        self.recalculate();
        self.notifier.success("Coupon removed");
        self.forget(COUPON_STORAGE_KEY);
    }

    fn recalculate(&mut self) {
        let applied = self
            .state
            .coupon
            .as_ref()
            .filter(|_| self.state.is_coupon_applied);
        let totals = recompute_totals(&self.state.cart, applied);
        self.state.subtotal = totals.subtotal;
        self.state.total = totals.total;
    }

    fn report(&self, err: &ClientError, fallback: &str) {
        tracing::debug!(error = %err, "cart operation failed");
        self.notifier.error(err.server_message().unwrap_or(fallback));
    }

    fn persist_cart(&self) {
        self.write_snapshot(CART_STORAGE_KEY, &self.state.cart);
    }

    fn persist_coupon(&self) {
        let snapshot = CouponSnapshot {
            coupon: self.state.coupon.clone(),
            is_applied: self.state.is_coupon_applied,
        };
        self.write_snapshot(COUPON_STORAGE_KEY, &snapshot);
    }

    // Snapshots are a convenience cache; failing to write one never fails the operation.
    fn write_snapshot<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(ClientError::from)
            .and_then(|json| self.storage.save(key, &json));
        if let Err(err) = result {
            tracing::warn!(key, error = %err, "failed to persist snapshot");
        }
    }

    fn forget(&self, key: &str) {
        if let Err(err) = self.storage.remove(key) {
            tracing::warn!(key, error = %err, "failed to remove snapshot");
        }
    }
}

fn read_snapshot<T: DeserializeOwned + Default>(storage: &impl SnapshotStore, key: &str) -> T {
    let parsed = storage.load(key).and_then(|raw| match raw {
        Some(raw) => Ok(Some(serde_json::from_str::<T>(&raw)?)),
        None => Ok(None),
    });
    match parsed {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring unreadable snapshot");
            T::default()
        }
    }
}
