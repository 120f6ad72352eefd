//! Checkout pre-flight validation.

use crate::cart::CartView;
use crate::types::{AddressId, Price};

/// Reasons a checkout is refused before reaching the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("You must have items in cart to proceed with checkout")]
    EmptyCart,
    #[error("You do not have enough balance in your wallet for this purchase")]
    InsufficientBalance { balance: Price, total: Price },
    #[error("Please select one shipping address to proceed.")]
    NoAddressSelected,
}

/// A checkout that passed every pre-flight check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovedCheckout<'a> {
    /// Address the order ships to.
    pub address: &'a AddressId,
    /// Wallet balance left after paying.
    pub remaining: Price,
}

/// Validate a checkout.
///
/// # Errors
///
/// Returns the first failing check: non-empty cart, sufficient wallet
/// balance, selected address.
pub fn validate_checkout<'a>(
    cart: &CartView,
    balance: Price,
    address: Option<&'a AddressId>,
) -> Result<ApprovedCheckout<'a>, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let remaining = balance
        .checked_sub(cart.total)
        .ok_or(CheckoutError::InsufficientBalance {
            balance,
            total: cart.total,
        })?;

    let address = address.ok_or(CheckoutError::NoAddressSelected)?;

    Ok(ApprovedCheckout { address, remaining })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartEntry;
    use crate::types::{Product, ProductId};

    fn cart_worth(cost: u64) -> CartView {
        let products = vec![Product {
            id: ProductId::new("A"),
            name: "Racquet".to_string(),
            category: "Sports".to_string(),
            cost: Price::new(cost),
            rating: 5.0,
            image_url: String::new(),
        }];
        CartView::from_parts(Some(&[CartEntry::new("A", 1)]), &products)
    }

    #[test]
    fn test_empty_cart_rejected() {
        let address = AddressId::new("addr");
        assert_eq!(
            validate_checkout(&CartView::empty(), Price::new(5000), Some(&address)),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_insufficient_balance_rejected() {
        let address = AddressId::new("addr");
        let result = validate_checkout(&cart_worth(260), Price::new(100), Some(&address));
        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_missing_address_rejected() {
        assert_eq!(
            validate_checkout(&cart_worth(260), Price::new(5000), None),
            Err(CheckoutError::NoAddressSelected)
        );
    }

    #[test]
    fn test_exact_balance_allowed() {
        let address = AddressId::new("addr");
        assert_eq!(
            validate_checkout(&cart_worth(260), Price::new(260), Some(&address))
                .map(|approved| approved.remaining),
            Ok(Price::ZERO)
        );
    }

    #[test]
    fn test_approved_checkout_carries_address_and_remaining() {
        let address = AddressId::new("addr");
        assert_eq!(
            validate_checkout(&cart_worth(260), Price::new(5000), Some(&address)),
            Ok(ApprovedCheckout {
                address: &address,
                remaining: Price::new(4740),
            })
        );
    }
}
