//! Shipping address commands.

use qkart_client::{FileStore, Storefront};
use qkart_core::AddressId;

use crate::{CliError, output};

pub async fn list(storefront: &Storefront<FileStore>) -> Result<(), CliError> {
    output::addresses(&storefront.addresses().await?);
    Ok(())
}

pub async fn add(storefront: &Storefront<FileStore>, address: &str) -> Result<(), CliError> {
    output::addresses(&storefront.add_address(address).await?);
    Ok(())
}

pub async fn delete(storefront: &Storefront<FileStore>, address_id: &str) -> Result<(), CliError> {
    let remaining = storefront
        .delete_address(&AddressId::new(address_id))
        .await?;
    output::addresses(&remaining);
    Ok(())
}
