//! Newtype IDs for type-safe entity references.
//!
//! The backend hands out opaque string identifiers (`"v4sLtEcMpzabRyfx"`).
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! passing an address ID where a product ID is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use qkart_core::define_id;
/// define_id!(WishlistId);
/// define_id!(OrderId);
///
/// let wishlist = WishlistId::new("abc");
/// let order = OrderId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: WishlistId = order;
/// assert_eq!(wishlist.as_str(), order.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(AddressId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ProductId::new("KCRwjF7lN97HnEaY");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"KCRwjF7lN97HnEaY\"");
    }

    #[test]
    fn test_id_display_and_conversions() {
        let id = AddressId::from("addr-1");
        assert_eq!(id.to_string(), "addr-1");
        assert_eq!(id.as_ref(), "addr-1");
        assert_eq!(id.into_inner(), "addr-1".to_string());
    }
}
