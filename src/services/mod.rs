pub mod cart_service;
pub mod coupon_service;
