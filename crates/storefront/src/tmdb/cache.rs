//! Cache types for TMDB API responses.

/// Cache key for a page of search results.
///
/// Queries are normalized (trimmed, lowercased) so that "Jack Reacher" and
/// "jack reacher " share an entry.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct SearchCacheKey {
    pub query: String,
    pub page: u32,
}

impl SearchCacheKey {
    pub fn new(query: &str, page: u32) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_query() {
        assert_eq!(
            SearchCacheKey::new("  Jack Reacher ", 2),
            SearchCacheKey::new("jack reacher", 2)
        );
        assert_ne!(
            SearchCacheKey::new("jack reacher", 1),
            SearchCacheKey::new("jack reacher", 2)
        );
    }
}
