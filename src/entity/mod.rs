pub mod audit_logs;
pub mod cart_items;
pub mod coupons;
pub mod products;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use coupons::Entity as Coupons;
pub use products::Entity as Products;
pub use users::Entity as Users;
