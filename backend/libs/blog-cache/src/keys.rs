//! Unified cache key schema
//!
//! Key format: v{VERSION}:{entity}:{identifier}[:sub_key]

use uuid::Uuid;

/// Cache schema version - increment when changing key formats or cached payload shapes
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    // ============= Content Keys =============

    /// List view of all content items, newest first
    /// Format: v1:content:list
    pub fn content_list() -> String {
        format!("v{}:content:list", CACHE_VERSION)
    }

    /// Single content item
    /// Format: v1:content:item:{item_id}
    pub fn content_item(item_id: Uuid) -> String {
        format!("v{}:content:item:{}", CACHE_VERSION, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_list_key() {
        assert_eq!(CacheKey::content_list(), "v1:content:list");
    }

    #[test]
    fn test_content_item_key() {
        let item_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let key = CacheKey::content_item(item_id);
        assert_eq!(key, "v1:content:item:550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_list_and_item_keys_never_overlap() {
        let item_id = Uuid::new_v4();
        let item_key = CacheKey::content_item(item_id);
        assert_ne!(item_key, CacheKey::content_list());
        assert!(!item_key.starts_with(&CacheKey::content_list()));
    }
}
