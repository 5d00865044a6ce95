use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("Quantity {current} + {added} is too large")]
    QuantityOverflow { current: i32, added: i32 },
}

/// Reject zero and negative quantities before touching the server or the store.
pub fn validate_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    Ok(())
}
