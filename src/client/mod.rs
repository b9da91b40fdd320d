//! Client-side cart view-model.
//!
//! [`CartStore`] mirrors the server cart, holds an optionally applied coupon,
//! recomputes totals after every change and keeps a local snapshot so the
//! cart can be shown before the first network round-trip completes.

pub mod api;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;
pub mod totals;

pub use api::{CartApi, HttpCartApi};
pub use error::ClientError;
pub use notify::{Notifier, TracingNotifier};
pub use storage::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use store::{CartState, CartStore, CouponSnapshot};
pub use totals::{Totals, recompute_totals};
