use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::{mock, predicate::eq};
use rust_decimal::Decimal;
use storefront_cart::{
    client::{
        CartApi, CartStore, ClientError, MemorySnapshotStore, Notifier, SnapshotStore,
        storage::{CART_STORAGE_KEY, COUPON_STORAGE_KEY},
    },
    models::{CartLine, CartProduct, Coupon, Product},
};
use uuid::Uuid;

mock! {
    Api {}

    #[async_trait]
    impl CartApi for Api {
        async fn get_cart(&self) -> Result<Vec<CartProduct>, ClientError>;
        async fn add_to_cart(&self, product_id: Uuid) -> Result<Vec<CartLine>, ClientError>;
        async fn remove_from_cart(&self, product_id: Uuid) -> Result<Vec<CartLine>, ClientError>;
        async fn update_quantity(&self, product_id: Uuid, quantity: i32) -> Result<Vec<CartLine>, ClientError>;
        async fn clear_cart(&self) -> Result<(), ClientError>;
        async fn get_coupon(&self) -> Result<Option<Coupon>, ClientError>;
        async fn validate_coupon(&self, code: String) -> Result<Coupon, ClientError>;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Note {
    Success(String),
    Error(String),
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    notes: Arc<Mutex<Vec<Note>>>,
}

impl RecordingNotifier {
    fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notes.lock().unwrap().push(Note::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notes.lock().unwrap().push(Note::Error(message.to_string()));
    }
}

fn product(name: &str, price: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        price,
        image: None,
    }
}

fn line(product: &Product, quantity: i32) -> CartProduct {
    CartProduct {
        product: product.clone(),
        quantity,
    }
}

fn coupon(discount_percentage: i32) -> Coupon {
    Coupon {
        code: "GIFT20".into(),
        discount_percentage,
        expires_at: Utc::now() + Duration::days(30),
        is_active: true,
        user_id: Uuid::new_v4(),
    }
}

fn store_with(
    api: MockApi,
) -> (
    CartStore<MockApi, MemorySnapshotStore, RecordingNotifier>,
    MemorySnapshotStore,
    RecordingNotifier,
) {
    let storage = MemorySnapshotStore::new();
    let notifier = RecordingNotifier::default();
    let store = CartStore::load(api, storage.clone(), notifier.clone());
    (store, storage, notifier)
}

#[tokio::test]
async fn fresh_store_is_empty() {
    let (store, _, _) = store_with(MockApi::new());

    assert!(store.cart().is_empty());
    assert!(store.coupon().is_none());
    assert_eq!(store.subtotal(), Decimal::ZERO);
    assert_eq!(store.total(), Decimal::ZERO);
}

#[tokio::test]
async fn get_cart_items_replaces_cart_and_recomputes() {
    let mug = product("Ferris Mug", 10);
    let stickers = product("Stickers", 5);
    let server_cart = vec![line(&mug, 2), line(&stickers, 1)];

    let mut api = MockApi::new();
    let returned = server_cart.clone();
    api.expect_get_cart()
        .times(1)
        .returning(move || Ok(returned.clone()));

    let (mut store, storage, _) = store_with(api);
    store.get_cart_items().await.unwrap();

    assert_eq!(store.cart(), server_cart.as_slice());
    assert_eq!(store.subtotal(), Decimal::from(25));
    assert_eq!(store.total(), Decimal::from(25));
    assert_eq!(
        storage.load(CART_STORAGE_KEY).unwrap(),
        Some(serde_json::to_string(&server_cart).unwrap())
    );
}

#[tokio::test]
async fn failed_get_cart_items_resets_to_empty() {
    let mug = product("Ferris Mug", 10);
    let storage = MemorySnapshotStore::new();
    storage
        .save(
            CART_STORAGE_KEY,
            &serde_json::to_string(&vec![line(&mug, 3)]).unwrap(),
        )
        .unwrap();

    let mut api = MockApi::new();
    api.expect_get_cart()
        .returning(|| Err(ClientError::Transient("Internal Server Error".into())));

    let notifier = RecordingNotifier::default();
    let mut store = CartStore::load(api, storage.clone(), notifier.clone());
    assert_eq!(store.subtotal(), Decimal::from(30));

    let err = store.get_cart_items().await.unwrap_err();
    assert!(matches!(err, ClientError::Transient(_)));
    assert!(store.cart().is_empty());
    assert_eq!(store.subtotal(), Decimal::ZERO);
    assert_eq!(
        notifier.notes(),
        vec![Note::Error("Internal Server Error".into())]
    );
}

#[tokio::test]
async fn adding_same_product_twice_yields_one_line() {
    let mug = product("Ferris Mug", 12);
    let mut api = MockApi::new();
    let id = mug.id;
    api.expect_add_to_cart()
        .with(eq(id))
        .times(2)
        .returning(move |product_id| {
            Ok(vec![CartLine {
                product_id,
                quantity: 1,
            }])
        });

    let (mut store, _, notifier) = store_with(api);
    store.add_to_cart(&mug).await.unwrap();
    store.add_to_cart(&mug).await.unwrap();

    assert_eq!(store.cart().len(), 1);
    assert_eq!(store.cart()[0].quantity, 2);
    assert_eq!(store.subtotal(), Decimal::from(24));
    assert_eq!(
        notifier.notes(),
        vec![
            Note::Success("Product added to cart".into()),
            Note::Success("Product added to cart".into())
        ]
    );
}

#[tokio::test]
async fn failed_add_rolls_back() {
    let mug = product("Ferris Mug", 12);
    let mut api = MockApi::new();
    api.expect_add_to_cart()
        .returning(|_| Err(ClientError::NotFound("Product not found".into())));

    let (mut store, storage, notifier) = store_with(api);
    let err = store.add_to_cart(&mug).await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
    assert!(store.cart().is_empty());
    assert_eq!(storage.load(CART_STORAGE_KEY).unwrap(), None);
    assert_eq!(notifier.notes(), vec![Note::Error("Product not found".into())]);
}

#[tokio::test]
async fn update_quantity_sets_line_and_totals() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 1)];
    api.expect_get_cart()
        .returning(move || Ok(returned.clone()));
    api.expect_update_quantity()
        .with(eq(mug.id), eq(4))
        .times(1)
        .returning(|product_id, quantity| {
            Ok(vec![CartLine {
                product_id,
                quantity,
            }])
        });

    let (mut store, _, _) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.update_quantity(mug.id, 4).await.unwrap();

    assert_eq!(store.cart()[0].quantity, 4);
    assert_eq!(store.subtotal(), Decimal::from(40));
}

#[tokio::test]
async fn update_to_zero_removes_instead_of_updating() {
    let mug = product("Ferris Mug", 10);
    let stickers = product("Stickers", 5);

    let cart = vec![line(&mug, 2), line(&stickers, 1)];
    let mut zeroed = MockApi::new();
    let returned = cart.clone();
    zeroed.expect_get_cart().returning(move || Ok(returned.clone()));
    zeroed.expect_update_quantity().never();
    zeroed
        .expect_remove_from_cart()
        .with(eq(mug.id))
        .times(1)
        .returning(|_| Ok(vec![]));

    let mut removed = MockApi::new();
    let returned = cart.clone();
    removed.expect_get_cart().returning(move || Ok(returned.clone()));
    removed
        .expect_remove_from_cart()
        .with(eq(mug.id))
        .times(1)
        .returning(|_| Ok(vec![]));

    let (mut by_zero, _, _) = store_with(zeroed);
    by_zero.get_cart_items().await.unwrap();
    by_zero.update_quantity(mug.id, 0).await.unwrap();

    let (mut by_remove, _, _) = store_with(removed);
    by_remove.get_cart_items().await.unwrap();
    by_remove.remove_from_cart(mug.id).await.unwrap();

    assert_eq!(by_zero.state(), by_remove.state());
    assert_eq!(by_zero.cart(), vec![line(&stickers, 1)].as_slice());
    assert_eq!(by_zero.total(), Decimal::from(5));
}

#[tokio::test]
async fn failed_remove_keeps_state() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 2)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_remove_from_cart()
        .returning(|_| Err(ClientError::Unauthorized("Invalid or expired token".into())));

    let (mut store, _, notifier) = store_with(api);
    store.get_cart_items().await.unwrap();
    let before = store.state().clone();

    assert!(store.remove_from_cart(mug.id).await.is_err());
    assert_eq!(store.state(), &before);
    assert_eq!(
        notifier.notes(),
        vec![Note::Error("Invalid or expired token".into())]
    );
}

#[tokio::test]
async fn apply_coupon_discounts_total() {
    let mug = product("Ferris Mug", 10);
    let stickers = product("Stickers", 5);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 2), line(&stickers, 1)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_validate_coupon()
        .with(eq("GIFT20".to_string()))
        .returning(|_| Ok(coupon(20)));

    let (mut store, storage, notifier) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.apply_coupon("GIFT20").await.unwrap();

    assert!(store.is_coupon_applied());
    assert_eq!(store.subtotal(), Decimal::from(25));
    assert_eq!(store.total(), Decimal::from(20));
    assert!(storage.load(COUPON_STORAGE_KEY).unwrap().is_some());
    assert_eq!(
        notifier.notes(),
        vec![Note::Success("Coupon applied successfully".into())]
    );
}

#[tokio::test]
async fn rejected_coupon_uses_server_message() {
    let mut api = MockApi::new();
    api.expect_validate_coupon()
        .returning(|_| Err(ClientError::NotFound("Coupon expired".into())));

    let (mut store, _, notifier) = store_with(api);
    assert!(store.apply_coupon("OLD").await.is_err());

    assert!(!store.is_coupon_applied());
    assert!(store.coupon().is_none());
    assert_eq!(notifier.notes(), vec![Note::Error("Coupon expired".into())]);
}

#[tokio::test]
async fn failure_without_server_message_uses_fallback() {
    let mut api = MockApi::new();
    api.expect_validate_coupon().returning(|_| {
        Err(ClientError::Storage(std::io::Error::other(
            "connection reset",
        )))
    });

    let (mut store, _, notifier) = store_with(api);
    assert!(store.apply_coupon("GIFT20").await.is_err());
    assert_eq!(
        notifier.notes(),
        vec![Note::Error("Failed to apply coupon".into())]
    );
}

#[tokio::test]
async fn fetched_coupon_is_not_applied() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 3)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_get_coupon().returning(|| Ok(Some(coupon(50))));

    let (mut store, _, _) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.fetch_coupon().await.unwrap();

    assert!(store.coupon().is_some());
    assert!(!store.is_coupon_applied());
    assert_eq!(store.total(), store.subtotal());
}

#[tokio::test]
async fn fetching_a_different_coupon_drops_the_applied_discount() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 10)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_validate_coupon()
        .with(eq("GIFT20".to_string()))
        .returning(|_| Ok(coupon(10)));
    api.expect_get_coupon().returning(|| {
        Ok(Some(Coupon {
            code: "OTHER90".into(),
            ..coupon(90)
        }))
    });

    let (mut store, storage, _) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.apply_coupon("GIFT20").await.unwrap();
    assert_eq!(store.total(), Decimal::from(90));

    store.fetch_coupon().await.unwrap();

    assert_eq!(store.coupon().map(|c| c.code.as_str()), Some("OTHER90"));
    assert!(!store.is_coupon_applied());
    assert_eq!(store.total(), Decimal::from(100));

    let reloaded = CartStore::load(MockApi::new(), storage, RecordingNotifier::default());
    assert!(!reloaded.is_coupon_applied());
}

#[tokio::test]
async fn fetching_the_applied_coupon_keeps_it_applied() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 10)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_validate_coupon().returning(|_| Ok(coupon(10)));
    api.expect_get_coupon().returning(|| Ok(Some(coupon(10))));

    let (mut store, _, _) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.apply_coupon("GIFT20").await.unwrap();
    store.fetch_coupon().await.unwrap();

    assert!(store.is_coupon_applied());
    assert_eq!(store.total(), Decimal::from(90));
}

#[tokio::test]
async fn remove_coupon_restores_total() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 3)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_validate_coupon().returning(|_| Ok(coupon(50)));

    let (mut store, storage, notifier) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.apply_coupon("GIFT20").await.unwrap();
    assert_eq!(store.total(), Decimal::from(15));

    store.remove_coupon();

    assert!(store.coupon().is_none());
    assert!(!store.is_coupon_applied());
    assert_eq!(store.total(), Decimal::from(30));
    assert_eq!(storage.load(COUPON_STORAGE_KEY).unwrap(), None);
    assert_eq!(
        notifier.notes().last(),
        Some(&Note::Success("Coupon removed".into()))
    );
}

#[tokio::test]
async fn clear_cart_drops_everything() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 3)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_validate_coupon().returning(|_| Ok(coupon(10)));
    api.expect_clear_cart().times(1).returning(|| Ok(()));

    let (mut store, storage, _) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.apply_coupon("GIFT20").await.unwrap();
    store.clear_cart().await.unwrap();

    assert!(store.cart().is_empty());
    assert!(store.coupon().is_none());
    assert!(!store.is_coupon_applied());
    assert_eq!(store.subtotal(), Decimal::ZERO);
    assert_eq!(store.total(), Decimal::ZERO);
    assert_eq!(storage.load(CART_STORAGE_KEY).unwrap(), None);
    assert_eq!(storage.load(COUPON_STORAGE_KEY).unwrap(), None);
}

#[tokio::test]
async fn failed_clear_keeps_cart() {
    let mug = product("Ferris Mug", 10);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 3)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_clear_cart()
        .returning(|| Err(ClientError::Transient("Database error".into())));

    let (mut store, _, notifier) = store_with(api);
    store.get_cart_items().await.unwrap();
    assert!(store.clear_cart().await.is_err());

    assert_eq!(store.cart().len(), 1);
    assert_eq!(
        notifier.notes(),
        vec![Note::Error("Failed to clear the cart".into())]
    );
}

#[tokio::test]
async fn snapshots_reload_identically() {
    let mug = product("Ferris Mug", 10);
    let hoodie = product("Axum Hoodie", 55);
    let mut api = MockApi::new();
    let returned = vec![line(&mug, 2), line(&hoodie, 1)];
    api.expect_get_cart().returning(move || Ok(returned.clone()));
    api.expect_validate_coupon().returning(|_| Ok(coupon(20)));

    let (mut store, storage, _) = store_with(api);
    store.get_cart_items().await.unwrap();
    store.apply_coupon("GIFT20").await.unwrap();

    let cart_bytes = storage.load(CART_STORAGE_KEY).unwrap().unwrap();
    let coupon_bytes = storage.load(COUPON_STORAGE_KEY).unwrap().unwrap();

    let reloaded = CartStore::load(
        MockApi::new(),
        storage.clone(),
        RecordingNotifier::default(),
    );

    assert_eq!(reloaded.state(), store.state());
    assert_eq!(serde_json::to_string(reloaded.cart()).unwrap(), cart_bytes);
    assert_eq!(
        storage.load(COUPON_STORAGE_KEY).unwrap().unwrap(),
        coupon_bytes
    );
}

#[tokio::test]
async fn unreadable_snapshot_starts_empty() {
    let storage = MemorySnapshotStore::new();
    storage.save(CART_STORAGE_KEY, "{not json").unwrap();

    let store = CartStore::load(MockApi::new(), storage, RecordingNotifier::default());
    assert!(store.cart().is_empty());
}
