//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, signed activation and reset tokens
//! - `coupons` - Discount coupon catalog
//! - `email` - Transactional mail (activation, password reset)
//! - `mercado_pago` - Checkout Pro client and payment verification
//! - `shipping` - Carrier cost schedule

pub mod auth;
pub mod coupons;
pub mod email;
pub mod mercado_pago;
pub mod shipping;
