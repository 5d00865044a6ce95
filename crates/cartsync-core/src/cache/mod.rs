//! Device-local key-value store.
//!
//! This module provides the `LocalStore`, which keeps the signed-out
//! shopper's cart and the cart badge count on disk so they survive
//! restarts. Each key is one JSON file in the cache directory:
//!
//! - `cart`: the local cart, a list of cart items
//! - `cartItemsCount`: the last count shown to the shopper

pub mod store;

pub use store::{CachedData, LocalStore};
