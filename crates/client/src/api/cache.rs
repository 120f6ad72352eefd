//! Cache keys for catalog responses.

/// Cache key for product listings. Search results are not cached.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
}
