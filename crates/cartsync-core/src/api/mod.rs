//! REST API client module for the shop backend.
//!
//! This module provides the `ApiClient` for the cart and category
//! endpoints. Requests carry a bearer token when the shopper is signed in;
//! the anonymous product lookup works without one.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
