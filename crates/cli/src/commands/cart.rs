//! Cart and checkout commands.

use qkart_client::{AddOptions, FileStore, Storefront};
use qkart_core::{AddressId, ProductId};

use crate::{CliError, output};

pub async fn show(storefront: &Storefront<FileStore>) -> Result<(), CliError> {
    let cart = storefront.cart().await?;
    output::cart(&cart);
    Ok(())
}

pub async fn add(
    storefront: &Storefront<FileStore>,
    product_id: &str,
    qty: u32,
    prevent_duplicate: bool,
) -> Result<(), CliError> {
    let cart = storefront
        .add_to_cart(
            &ProductId::new(product_id),
            qty,
            AddOptions { prevent_duplicate },
        )
        .await?;
    output::cart(&cart);
    Ok(())
}

pub async fn set(
    storefront: &Storefront<FileStore>,
    product_id: &str,
    qty: u32,
) -> Result<(), CliError> {
    let cart = storefront
        .set_quantity(&ProductId::new(product_id), qty)
        .await?;
    output::cart(&cart);
    Ok(())
}

pub async fn checkout(
    storefront: &Storefront<FileStore>,
    address_id: Option<&str>,
) -> Result<(), CliError> {
    let address_id = address_id.map(AddressId::new);
    let remaining = storefront.checkout(address_id.as_ref()).await?;
    output::success(&format!(
        "Order placed successfully. Remaining wallet balance {remaining}"
    ));
    Ok(())
}
