//! Liher Core - Shared types library.
//!
//! This crate provides common types used across all Liher Fashion components:
//! - `storefront` - Public-facing store (catalog, cart, checkout, payments)
//! - `admin` - Back-office panel (inventory, users, orders)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains types and pure shared logic - no I/O, no database
//! access, no HTTP clients. Anything both servers must agree on byte-for-byte
//! (token signing, the password policy) lives here.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`password`] - Password policy and Argon2id hashing
//! - [`tokens`] - Signed activation/reset tokens
//! - [`secrets`] - Startup strength checks for signing secrets

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod password;
pub mod secrets;
pub mod tokens;
pub mod types;

pub use types::*;
