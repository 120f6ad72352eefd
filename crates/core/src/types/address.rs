//! Shipping address type.

use serde::{Deserialize, Serialize};

use super::AddressId;

/// A saved shipping address from `GET /user/addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    pub address: String,
}
