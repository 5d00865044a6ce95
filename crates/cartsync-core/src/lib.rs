//! Cart and category sync layer for a storefront client.
//!
//! Signed-out shoppers keep their cart on the device; once they sign in,
//! the local cart is merged into their server cart and the server becomes
//! the source of truth. Category management always goes through the
//! server.
//!
//! The building blocks:
//! - [`api::ApiClient`]: REST client for the cart and category endpoints
//! - [`cache::LocalStore`]: JSON-file key-value store for the local cart
//! - [`auth`]: persisted sessions, keychain tokens, the [`auth::AuthState`] check
//! - [`services`]: [`services::CartService`] and [`services::CategoryService`]
//! - [`notify`]: change events for observers

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod notify;
pub mod services;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthState, CredentialStore, Session, SessionData, StaticAuth};
pub use cache::LocalStore;
pub use config::Config;
pub use models::{CartItem, CartProduct, Category, LocalCart, VariantKey};
pub use notify::{ChangeEvent, ChangeNotifier};
pub use services::{CartError, CartService, CategoryService};
