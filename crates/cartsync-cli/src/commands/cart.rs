//! Cart subcommands.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use uuid::Uuid;

use cartsync_core::{CartItem, ChangeEvent, LocalCart, VariantKey};

use crate::app::App;

/// Width of the product title column in `list` output
const TITLE_WIDTH: usize = 32;

pub async fn add(app: &App, product_id: Uuid, product_type_id: Uuid, quantity: i32) -> Result<()> {
    let cart = app.cart_service()?;
    let mut changes = cart.subscribe();

    cart.add_to_cart(CartItem::new(product_id, product_type_id, quantity)).await?;

    // add_to_cart always refreshes the count before returning
    if let Ok(ChangeEvent::CartCount(lines)) = changes.try_recv() {
        println!("Added. Cart has {} line(s).", lines);
    }
    Ok(())
}

pub async fn count(app: &App) -> Result<()> {
    let cart = app.cart_service()?;
    let count = cart.get_cart_items_count().await?;
    println!("{}", count);
    Ok(())
}

pub async fn list(app: &App) -> Result<()> {
    let cart = app.cart_service()?;
    let products = cart.get_cart_products().await?;

    if products.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }

    let mut total = Decimal::ZERO;
    for product in &products {
        total += product.line_total();
        println!(
            "{:<width$} {:<12} {:>4} x {:>8} = {:>9}",
            truncate(&product.title, TITLE_WIDTH),
            product.product_type,
            product.quantity,
            product.price.round_dp(2),
            product.line_total().round_dp(2),
            width = TITLE_WIDTH,
        );
        println!("  {} {}", product.product_id, product.product_type_id);
    }
    println!("Total: {}", total.round_dp(2));
    Ok(())
}

pub async fn remove(app: &App, product_id: Uuid, product_type_id: Uuid) -> Result<()> {
    let cart = app.cart_service()?;
    cart.remove_product_from_cart(product_id, product_type_id).await?;
    cart.get_cart_items_count().await?;
    Ok(())
}

pub async fn update(app: &App, product_id: Uuid, product_type_id: Uuid, quantity: i32) -> Result<()> {
    let cart = app.cart_service()?;
    let key = VariantKey::new(product_id, product_type_id);

    // Signed out, the local cart is the whole truth; no lookup request needed
    if !app.is_authenticated() && !in_local_cart(cart.store().load_cart()?.as_ref(), key) {
        bail!("{} / {} is not in the cart", product_id, product_type_id);
    }

    cart.update_item_quantity(key, quantity).await?;
    Ok(())
}

fn in_local_cart(cart: Option<&LocalCart>, key: VariantKey) -> bool {
    cart.is_some_and(|c| c.get(key).is_some())
}

/// Truncate a string to a maximum length, adding ellipsis if needed
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_local_cart() {
        let key = VariantKey::new(Uuid::from_u128(1), Uuid::from_u128(10));
        let cart = LocalCart::try_from(vec![CartItem::new(key.product_id, key.product_type_id, 1)])
            .expect("Failed to build cart");

        assert!(in_local_cart(Some(&cart), key));
        assert!(!in_local_cart(Some(&cart), VariantKey::new(Uuid::from_u128(2), Uuid::from_u128(10))));
        assert!(!in_local_cart(None, key));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("The Left Hand of Darkness", 12), "The Left ...");
        assert_eq!(truncate("Neuromancer", 11), "Neuromancer");
    }
}
