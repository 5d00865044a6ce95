use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::CartError;

/// Identifies one purchasable variant: a product in a given product type
/// (size, format, edition...). Carts hold at most one line per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub product_id: Uuid,
    pub product_type_id: Uuid,
}

impl VariantKey {
    pub fn new(product_id: Uuid, product_type_id: Uuid) -> Self {
        Self {
            product_id,
            product_type_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub product_type_id: Uuid,
    pub quantity: i32,
}

impl CartItem {
    pub fn new(product_id: Uuid, product_type_id: Uuid, quantity: i32) -> Self {
        Self {
            product_id,
            product_type_id,
            quantity,
        }
    }

    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.product_id, self.product_type_id)
    }
}

/// Cart line enriched with catalog data, as returned by the API for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub product_id: Uuid,
    #[serde(default)]
    pub title: String,
    pub product_type_id: Uuid,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub image_url: String,
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub price: Decimal,
    pub quantity: i32,
}

impl CartProduct {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.product_id, self.product_type_id)
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl From<&CartProduct> for CartItem {
    fn from(product: &CartProduct) -> Self {
        CartItem::new(product.product_id, product.product_type_id, product.quantity)
    }
}

/// The cart kept on the device while nobody is signed in.
///
/// Serializes as a bare JSON array of `CartItem` so the stored `cart` key
/// is exactly the list the API's bulk endpoints accept. Adding a variant
/// that is already present bumps its quantity instead of appending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalCart {
    items: Vec<CartItem>,
}

impl LocalCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an item into the cart, summing quantities for a known variant.
    /// A sum that does not fit the quantity type leaves the cart unchanged.
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        match self.find_mut(item.key()) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or(
                    CartError::QuantityOverflow {
                        current: existing.quantity,
                        added: item.quantity,
                    },
                )?;
            }
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Remove the line for `key`. Returns false if the variant was not in the cart.
    pub fn remove(&mut self, key: VariantKey) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.key() != key);
        self.items.len() != before
    }

    /// Overwrite the quantity for `key`. Returns false if the variant was not in the cart.
    pub fn set_quantity(&mut self, key: VariantKey, quantity: i32) -> bool {
        match self.find_mut(key) {
            Some(existing) => {
                existing.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: VariantKey) -> Option<&CartItem> {
        self.items.iter().find(|i| i.key() == key)
    }

    fn find_mut(&mut self, key: VariantKey) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.key() == key)
    }

    /// Number of distinct lines (what the cart badge shows).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }
}

impl TryFrom<Vec<CartItem>> for LocalCart {
    type Error = CartError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        let mut cart = LocalCart::new();
        for item in items {
            cart.add(item)?;
        }
        Ok(cart)
    }
}
