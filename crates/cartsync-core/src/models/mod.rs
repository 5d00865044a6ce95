//! Data models for the storefront cart and catalog.
//!
//! This module contains the wire types exchanged with the shop API and
//! the local cart kept on the device for signed-out shoppers:
//!
//! - `CartItem`, `VariantKey`: a product variant and its quantity
//! - `CartProduct`: a cart line joined with catalog details for display
//! - `LocalCart`: the device-local cart, one entry per variant
//! - `Category`: product categories managed through the admin API

pub mod cart;
pub mod category;

pub use cart::{CartItem, CartProduct, LocalCart, VariantKey};
pub use category::Category;
