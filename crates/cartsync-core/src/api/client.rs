//! API client for the shop's cart and category endpoints.
//!
//! Every endpoint is relative to a configurable base URL. Failures are
//! never retried: a non-2xx status becomes an `ApiError` and propagates to
//! the caller.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{CartItem, CartProduct, Category, VariantKey};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured (local dev server)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the shop backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client with the default request timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Bearer token contains invalid header characters")?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Attach auth headers, send, and reject non-2xx statuses.
    async fn send(&self, request: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        debug!(method = method, url = url, authenticated = self.has_token(), "Sending request");
        let response = request
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        Self::check_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.client.get(&url), "GET", &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.client.post(&url).json(body), "POST", &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// POST where only the status matters; any response body is discarded.
    async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        self.send(self.client.post(&url).json(body), "POST", &url).await?;
        Ok(())
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.client.put(&url).json(body), "PUT", &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn put_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        self.send(self.client.put(&url).json(body), "PUT", &url).await?;
        Ok(())
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.client.delete(&url), "DELETE", &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn delete_unit(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        self.send(self.client.delete(&url), "DELETE", &url).await?;
        Ok(())
    }

    // ===== Cart =====

    /// Add an item to the signed-in shopper's cart (server merges duplicates)
    pub async fn add_cart_item(&self, item: &CartItem) -> Result<()> {
        self.post_unit("api/cart/add", item).await
    }

    /// Number of lines in the signed-in shopper's cart
    pub async fn fetch_cart_count(&self) -> Result<i32> {
        self.get("api/cart/count").await
    }

    /// Enriched lines of the signed-in shopper's cart
    pub async fn fetch_cart_products(&self) -> Result<Vec<CartProduct>> {
        self.get("api/cart").await
    }

    /// Resolve anonymous cart lines into enriched products
    pub async fn resolve_cart_products(&self, items: &[CartItem]) -> Result<Vec<CartProduct>> {
        self.post("api/cart/products", items).await
    }

    pub async fn remove_cart_item(&self, key: VariantKey) -> Result<()> {
        self.delete_unit(&format!("api/cart/{}/{}", key.product_id, key.product_type_id))
            .await
    }

    /// Upload a whole cart, merging it into the signed-in shopper's cart
    pub async fn store_cart_items(&self, items: &[CartItem]) -> Result<()> {
        self.post_unit("api/cart", items).await
    }

    pub async fn update_cart_quantity(&self, item: &CartItem) -> Result<()> {
        self.put_unit("api/cart/update-quantity", item).await
    }

    // ===== Categories =====

    /// Visible categories for the storefront
    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get("api/category").await
    }

    /// All non-deleted categories, including hidden ones
    pub async fn fetch_admin_categories(&self) -> Result<Vec<Category>> {
        self.get("api/category/admin").await
    }

    /// Create a category; returns the refreshed admin list
    pub async fn add_category(&self, category: &Category) -> Result<Vec<Category>> {
        self.post("api/category/admin", category).await
    }

    /// Update a category; returns the refreshed admin list
    pub async fn update_category(&self, category: &Category) -> Result<Vec<Category>> {
        self.put("api/category/admin", category).await
    }

    /// Delete a category; returns the refreshed admin list
    pub async fn delete_category(&self, category_id: i32) -> Result<Vec<Category>> {
        self.delete(&format!("api/category/admin/{}", category_id)).await
    }
}
