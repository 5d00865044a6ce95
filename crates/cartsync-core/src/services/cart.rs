//! Cart operations for signed-in and anonymous shoppers.
//!
//! Signed-in shoppers' carts live on the server; everyone else's cart lives
//! in the `cart` key of the local store until login, when
//! `store_cart_items` uploads it. A missing local cart behaves exactly like
//! an empty one.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::auth::AuthState;
use crate::cache::LocalStore;
use crate::models::{CartItem, CartProduct, LocalCart, VariantKey};
use crate::notify::{ChangeEvent, ChangeNotifier};

use super::error::validate_quantity;

pub struct CartService {
    api: ApiClient,
    store: LocalStore,
    auth: Arc<dyn AuthState>,
    notifier: ChangeNotifier,
}

impl CartService {
    pub fn new(api: ApiClient, store: LocalStore, auth: Arc<dyn AuthState>) -> Self {
        Self {
            api,
            store,
            auth,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Receive a `ChangeEvent::CartCount` every time the count is refreshed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.notifier.subscribe()
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    fn local_cart(&self) -> Result<LocalCart> {
        Ok(self.store.load_cart()?.unwrap_or_default())
    }

    /// Add an item, merging with an existing line for the same variant,
    /// then refresh the count.
    pub async fn add_to_cart(&self, item: CartItem) -> Result<()> {
        validate_quantity(item.quantity)?;

        if self.is_authenticated() {
            self.api.add_cart_item(&item).await?;
        } else {
            let mut cart = self.local_cart()?;
            cart.add(item)?;
            self.store.save_cart(&cart)?;
            debug!(lines = cart.len(), "Item added to local cart");
        }

        self.get_cart_items_count().await?;
        Ok(())
    }

    /// Refresh the cart badge count, persist it, and notify observers.
    ///
    /// Observers are notified even when the count is zero.
    pub async fn get_cart_items_count(&self) -> Result<i32> {
        let count = if self.is_authenticated() {
            self.api.fetch_cart_count().await?
        } else {
            let lines = self.store.load_cart()?.map(|c| c.len()).unwrap_or(0);
            i32::try_from(lines).unwrap_or(i32::MAX)
        };

        self.store.save_cart_count(count)?;
        self.notifier.notify(ChangeEvent::CartCount(count));
        Ok(count)
    }

    /// Last count written by `get_cart_items_count`, without any request.
    pub fn cached_items_count(&self) -> Result<i32> {
        Ok(self.store.load_cart_count()?.unwrap_or(0))
    }

    /// Cart lines enriched with catalog data for display.
    pub async fn get_cart_products(&self) -> Result<Vec<CartProduct>> {
        if self.is_authenticated() {
            return self.api.fetch_cart_products().await;
        }

        let cart = self.local_cart()?;
        if cart.is_empty() {
            return Ok(Vec::new());
        }
        self.api.resolve_cart_products(cart.items()).await
    }

    /// Remove one variant. Unknown variants are ignored.
    pub async fn remove_product_from_cart(&self, product_id: Uuid, product_type_id: Uuid) -> Result<()> {
        let key = VariantKey::new(product_id, product_type_id);

        if self.is_authenticated() {
            return self.api.remove_cart_item(key).await;
        }

        let Some(mut cart) = self.store.load_cart()? else {
            return Ok(());
        };
        if !cart.remove(key) {
            debug!(%product_id, %product_type_id, "Variant not in local cart");
            return Ok(());
        }

        if cart.is_empty() {
            self.store.remove_cart()
        } else {
            self.store.save_cart(&cart)
        }
    }

    /// Upload the local cart to the signed-in shopper's server cart.
    ///
    /// With `empty_local_cart`, the local cart is removed once the upload
    /// has succeeded; a failed upload leaves it untouched.
    pub async fn store_cart_items(&self, empty_local_cart: bool) -> Result<()> {
        let Some(cart) = self.store.load_cart()? else {
            return Ok(());
        };

        if !cart.is_empty() {
            self.api.store_cart_items(cart.items()).await?;
            info!(lines = cart.len(), "Local cart uploaded");
        }

        if empty_local_cart {
            self.store.remove_cart()?;
        }
        Ok(())
    }

    /// Set the quantity for the product's variant.
    pub async fn update_quantity(&self, product: &CartProduct) -> Result<()> {
        self.update_item_quantity(product.key(), product.quantity).await
    }

    /// Set the quantity for a variant by key. Signed-out shoppers never
    /// need the network for this.
    pub async fn update_item_quantity(&self, key: VariantKey, quantity: i32) -> Result<()> {
        validate_quantity(quantity)?;

        if self.is_authenticated() {
            let item = CartItem::new(key.product_id, key.product_type_id, quantity);
            return self.api.update_cart_quantity(&item).await;
        }

        let Some(mut cart) = self.store.load_cart()? else {
            return Ok(());
        };
        if cart.set_quantity(key, quantity) {
            self.store.save_cart(&cart)?;
        }
        Ok(())
    }

    /// Hand the anonymous cart over to the server after login and refresh the count.
    pub async fn merge_local_cart_on_login(&self) -> Result<i32> {
        self.store_cart_items(true).await?;
        self.get_cart_items_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;
    use crate::services::CartError;
    use rust_decimal::Decimal;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "tok-abc";

    struct Fixture {
        server: MockServer,
        _dir: tempfile::TempDir,
        service: CartService,
    }

    async fn fixture(authenticated: bool) -> Fixture {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LocalStore::new(dir.path().to_path_buf()).expect("Failed to create store");

        let mut api = ApiClient::new(&server.uri()).expect("Failed to build client");
        if authenticated {
            api.set_token(TOKEN.to_string());
        }

        let service = CartService::new(api, store, Arc::new(StaticAuth(authenticated)));
        Fixture {
            server,
            _dir: dir,
            service,
        }
    }

    fn item(product: u128, variant: u128, quantity: i32) -> CartItem {
        CartItem::new(Uuid::from_u128(product), Uuid::from_u128(variant), quantity)
    }

    fn cart_of(items: Vec<CartItem>) -> LocalCart {
        LocalCart::try_from(items).expect("Failed to build cart")
    }

    fn product(product: u128, variant: u128, quantity: i32) -> CartProduct {
        CartProduct {
            product_id: Uuid::from_u128(product),
            title: "Dune".to_string(),
            product_type_id: Uuid::from_u128(variant),
            product_type: "Hardcover".to_string(),
            image_url: String::new(),
            price: Decimal::new(1999, 2),
            quantity,
        }
    }

    // -------------------------------------------------------------------------
    // Anonymous shopper
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_first_add_creates_one_line_cart() {
        let f = fixture(false).await;
        assert!(f.service.store().load_cart().expect("load failed").is_none());

        f.service.add_to_cart(item(1, 10, 2)).await.expect("add failed");

        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.items(), &[item(1, 10, 2)]);
        assert_eq!(f.service.cached_items_count().expect("count failed"), 1);
    }

    #[tokio::test]
    async fn test_adding_same_variant_twice_sums_quantity() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, 2)).await.expect("add failed");
        f.service.add_to_cart(item(1, 10, 3)).await.expect("add failed");

        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let f = fixture(false).await;
        let err = f.service.add_to_cart(item(1, 10, 0)).await.expect_err("zero quantity accepted");

        assert_eq!(err.downcast_ref::<CartError>(), Some(&CartError::InvalidQuantity(0)));
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_add_overflowing_quantity_is_rejected_and_not_saved() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, i32::MAX)).await.expect("add failed");

        let err = f.service.add_to_cart(item(1, 10, 1)).await.expect_err("overflow accepted");

        assert_eq!(
            err.downcast_ref::<CartError>(),
            Some(&CartError::QuantityOverflow { current: i32::MAX, added: 1 })
        );
        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.items(), &[item(1, 10, i32::MAX)]);
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_quantity() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, 2)).await.expect("add failed");

        let err = f
            .service
            .update_quantity(&product(1, 10, -1))
            .await
            .expect_err("negative quantity accepted");

        assert_eq!(err.downcast_ref::<CartError>(), Some(&CartError::InvalidQuantity(-1)));
        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.items(), &[item(1, 10, 2)]);
    }

    #[tokio::test]
    async fn test_authenticated_update_rejects_zero_without_request() {
        let f = fixture(true).await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/update-quantity"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&f.server)
            .await;

        assert!(f.service.update_quantity(&product(1, 10, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_without_local_cart_does_not_create_one() {
        let f = fixture(false).await;
        f.service.update_quantity(&product(1, 10, 3)).await.expect("update failed");
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_update_by_key_works_offline() {
        let f = fixture(false).await;
        // Any request would hit this and fail the call count
        Mock::given(method("POST"))
            .and(path("/api/cart/products"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&f.server)
            .await;
        f.service.add_to_cart(item(1, 10, 1)).await.expect("add failed");

        f.service
            .update_item_quantity(VariantKey::new(Uuid::from_u128(1), Uuid::from_u128(10)), 4)
            .await
            .expect("update failed");

        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.items(), &[item(1, 10, 4)]);
    }

    #[tokio::test]
    async fn test_count_notifies_even_when_empty() {
        let f = fixture(false).await;
        let mut rx = f.service.subscribe();

        let count = f.service.get_cart_items_count().await.expect("count failed");

        assert_eq!(count, 0);
        assert_eq!(rx.recv().await.expect("no change event"), ChangeEvent::CartCount(0));
        assert_eq!(f.service.store().load_cart_count().expect("load failed"), Some(0));
    }

    #[tokio::test]
    async fn test_add_notifies_new_count() {
        let f = fixture(false).await;
        let mut rx = f.service.subscribe();

        f.service.add_to_cart(item(1, 10, 1)).await.expect("add failed");
        f.service.add_to_cart(item(2, 10, 1)).await.expect("add failed");

        assert_eq!(rx.recv().await.expect("no change event"), ChangeEvent::CartCount(1));
        assert_eq!(rx.recv().await.expect("no change event"), ChangeEvent::CartCount(2));
    }

    #[tokio::test]
    async fn test_remove_missing_variant_is_noop() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, 1)).await.expect("add failed");
        let before = f.service.store().load_cart().expect("load failed");

        f.service
            .remove_product_from_cart(Uuid::from_u128(9), Uuid::from_u128(9))
            .await
            .expect("remove failed");

        assert_eq!(f.service.store().load_cart().expect("load failed"), before);
    }

    #[tokio::test]
    async fn test_remove_without_local_cart_does_not_create_one() {
        let f = fixture(false).await;
        f.service
            .remove_product_from_cart(Uuid::from_u128(1), Uuid::from_u128(10))
            .await
            .expect("remove failed");
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_removing_last_line_destroys_local_cart() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, 1)).await.expect("add failed");
        f.service.add_to_cart(item(2, 10, 1)).await.expect("add failed");

        f.service
            .remove_product_from_cart(Uuid::from_u128(1), Uuid::from_u128(10))
            .await
            .expect("remove failed");
        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.items(), &[item(2, 10, 1)]);

        f.service
            .remove_product_from_cart(Uuid::from_u128(2), Uuid::from_u128(10))
            .await
            .expect("remove failed");
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_update_quantity_sets_local_line() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, 1)).await.expect("add failed");

        f.service.update_quantity(&product(1, 10, 6)).await.expect("update failed");
        // Unknown variant leaves the cart alone
        f.service.update_quantity(&product(3, 10, 2)).await.expect("update failed");

        let cart = f.service.store().load_cart().expect("load failed").expect("cart missing");
        assert_eq!(cart.items(), &[item(1, 10, 6)]);
    }

    #[tokio::test]
    async fn test_products_without_local_cart_skip_lookup() {
        let f = fixture(false).await;
        Mock::given(method("POST"))
            .and(path("/api/cart/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&f.server)
            .await;

        let products = f.service.get_cart_products().await.expect("products failed");
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_products_resolve_local_cart() {
        let f = fixture(false).await;
        f.service.add_to_cart(item(1, 10, 2)).await.expect("add failed");

        Mock::given(method("POST"))
            .and(path("/api/cart/products"))
            .and(body_json(serde_json::json!([
                {"productId": Uuid::from_u128(1), "productTypeId": Uuid::from_u128(10), "quantity": 2}
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![product(1, 10, 2)]))
            .expect(1)
            .mount(&f.server)
            .await;

        let products = f.service.get_cart_products().await.expect("products failed");
        assert_eq!(products, vec![product(1, 10, 2)]);
        assert_eq!(products[0].line_total(), Decimal::new(3998, 2));
    }

    #[tokio::test]
    async fn test_store_cart_items_without_local_cart_is_noop() {
        let f = fixture(true).await;
        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&f.server)
            .await;

        f.service.store_cart_items(true).await.expect("store failed");
    }

    #[tokio::test]
    async fn test_store_cart_items_clears_after_successful_upload() {
        let f = fixture(true).await;
        let cart = cart_of(vec![item(1, 10, 2)]);
        f.service.store().save_cart(&cart).expect("save failed");

        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&f.server)
            .await;

        f.service.store_cart_items(true).await.expect("store failed");
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_store_cart_items_keeps_cart_when_upload_fails() {
        let f = fixture(true).await;
        let cart = cart_of(vec![item(1, 10, 2)]);
        f.service.store().save_cart(&cart).expect("save failed");

        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .expect(1)
            .mount(&f.server)
            .await;

        assert!(f.service.store_cart_items(true).await.is_err());
        assert_eq!(f.service.store().load_cart().expect("load failed"), Some(cart));
    }

    #[tokio::test]
    async fn test_store_cart_items_can_keep_local_copy() {
        let f = fixture(true).await;
        let cart = cart_of(vec![item(1, 10, 2)]);
        f.service.store().save_cart(&cart).expect("save failed");

        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&f.server)
            .await;

        f.service.store_cart_items(false).await.expect("store failed");
        assert_eq!(f.service.store().load_cart().expect("load failed"), Some(cart));
    }

    // -------------------------------------------------------------------------
    // Signed-in shopper
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_authenticated_add_goes_to_server_and_refreshes_count() {
        let f = fixture(true).await;
        Mock::given(method("POST"))
            .and(path("/api/cart/add"))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&f.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(3))
            .expect(1)
            .mount(&f.server)
            .await;

        let mut rx = f.service.subscribe();
        f.service.add_to_cart(item(1, 10, 1)).await.expect("add failed");

        assert_eq!(rx.recv().await.expect("no change event"), ChangeEvent::CartCount(3));
        assert_eq!(f.service.cached_items_count().expect("count failed"), 3);
        // Nothing written to the local cart
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_authenticated_products_come_from_server() {
        let f = fixture(true).await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![product(4, 40, 1)]))
            .expect(1)
            .mount(&f.server)
            .await;

        let products = f.service.get_cart_products().await.expect("products failed");
        assert_eq!(products, vec![product(4, 40, 1)]);
    }

    #[tokio::test]
    async fn test_authenticated_remove_issues_delete() {
        let f = fixture(true).await;
        Mock::given(method("DELETE"))
            .and(path(format!("/api/cart/{}/{}", Uuid::from_u128(1), Uuid::from_u128(10))))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&f.server)
            .await;

        f.service
            .remove_product_from_cart(Uuid::from_u128(1), Uuid::from_u128(10))
            .await
            .expect("remove failed");
    }

    #[tokio::test]
    async fn test_authenticated_update_sends_cart_item() {
        let f = fixture(true).await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/update-quantity"))
            .and(body_json(serde_json::json!({
                "productId": Uuid::from_u128(1),
                "productTypeId": Uuid::from_u128(10),
                "quantity": 4
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&f.server)
            .await;

        f.service.update_quantity(&product(1, 10, 4)).await.expect("update failed");
    }

    #[tokio::test]
    async fn test_merge_on_login_uploads_then_counts() {
        let f = fixture(true).await;
        f.service
            .store()
            .save_cart(&cart_of(vec![item(1, 10, 1), item(2, 20, 2)]))
            .expect("save failed");

        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&f.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(5))
            .expect(1)
            .mount(&f.server)
            .await;

        let count = f.service.merge_local_cart_on_login().await.expect("merge failed");
        assert_eq!(count, 5);
        assert!(f.service.store().load_cart().expect("load failed").is_none());
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let f = fixture(true).await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&f.server)
            .await;

        let mut rx = f.service.subscribe();
        let err = f.service.get_cart_items_count().await.expect_err("503 should fail");

        assert!(matches!(
            err.downcast_ref::<crate::api::ApiError>(),
            Some(crate::api::ApiError::ServerError(_))
        ));
        // No event for a failed refresh
        assert!(rx.try_recv().is_err());
    }
}
