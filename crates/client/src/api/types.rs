//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

use qkart_core::{AddressId, ProductId};

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

/// Plain `{success}` acknowledgement.
#[derive(Debug, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `POST /auth/login` response.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
    pub balance: u64,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("success", &self.success)
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("balance", &self.balance)
            .finish()
    }
}

/// `POST /cart` body.
#[derive(Debug, Serialize)]
pub struct CartUpdateRequest<'a> {
    #[serde(rename = "productId")]
    pub product_id: &'a ProductId,
    pub qty: u32,
}

/// `POST /user/addresses` body.
#[derive(Debug, Serialize)]
pub struct NewAddressRequest<'a> {
    pub address: &'a str,
}

/// `POST /cart/checkout` body.
#[derive(Debug, Serialize)]
pub struct CheckoutRequest<'a> {
    #[serde(rename = "addressId")]
    pub address_id: &'a AddressId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_update_body() {
        let id = ProductId::new("BW0jAAeDJmlZCF8i");
        let body = serde_json::to_value(CartUpdateRequest {
            product_id: &id,
            qty: 2,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"productId": "BW0jAAeDJmlZCF8i", "qty": 2})
        );
    }

    #[test]
    fn test_checkout_body() {
        let id = AddressId::new("addr-1");
        let body = serde_json::to_value(CheckoutRequest { address_id: &id }).unwrap();
        assert_eq!(body, serde_json::json!({"addressId": "addr-1"}));
    }

    #[test]
    fn test_login_response_debug_redacts_token() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"success":true,"token":"testtoken","username":"criodo","balance":5000}"#,
        )
        .unwrap();
        let debug_output = format!("{response:?}");
        assert!(debug_output.contains("criodo"));
        assert!(!debug_output.contains("testtoken"));
    }

    #[test]
    fn test_error_body_without_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!body.success);
        assert!(body.message.is_none());
    }
}
