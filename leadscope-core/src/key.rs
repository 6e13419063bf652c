//! Composite cache key for one page of one result set.

use crate::filter::SelectionTriple;
use crate::PageNumber;
use std::fmt;

/// Key into the page cache: a page number within a selection triple.
///
/// Equality and hashing cover all four components exactly. The `Display`
/// form is the delimited join `page|search|status|category`, stable for
/// equal keys, and is what gets logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    page: PageNumber,
    triple: SelectionTriple,
}

impl CacheKey {
    pub fn new(page: PageNumber, triple: SelectionTriple) -> Self {
        Self { page, triple }
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }

    pub fn triple(&self) -> &SelectionTriple {
        &self.triple
    }

    /// Key for another page of the same result set.
    pub fn with_page(&self, page: PageNumber) -> Self {
        Self {
            page,
            triple: self.triple.clone(),
        }
    }

    /// Whether this key belongs to the given result set.
    pub fn belongs_to(&self, triple: &SelectionTriple) -> bool {
        &self.triple == triple
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.page, self.triple.search, self.triple.status, self.triple.category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{CategoryFilter, StatusFilter};
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &CacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn status_strategy() -> impl Strategy<Value = StatusFilter> {
        prop_oneof![
            Just(StatusFilter::All),
            Just(StatusFilter::New),
            Just(StatusFilter::Scraped),
        ]
    }

    #[test]
    fn test_display_is_delimited_join() {
        let key = CacheKey::new(
            3,
            SelectionTriple::new(
                "acme",
                StatusFilter::Scraped,
                CategoryFilter::Industry("ind-1".to_string()),
            ),
        );
        assert_eq!(key.to_string(), "3|acme|scraped|ind-1");

        let key = CacheKey::new(1, SelectionTriple::default());
        assert_eq!(key.to_string(), "1||all|all");
    }

    #[test]
    fn test_with_page_keeps_triple() {
        let key = CacheKey::new(1, SelectionTriple::default().with_search("x"));
        let next = key.with_page(2);
        assert_eq!(next.page(), 2);
        assert!(next.belongs_to(key.triple()));
        assert_ne!(key, next);
    }

    proptest! {
        #[test]
        fn equal_tuples_make_equal_keys(
            page in 1u32..500,
            search in ".{0,12}",
            status in status_strategy(),
            category in "[a-z0-9-]{1,8}",
        ) {
            let category: CategoryFilter = category.parse().unwrap();
            let a = CacheKey::new(page, SelectionTriple::new(search.clone(), status, category.clone()));
            let b = CacheKey::new(page, SelectionTriple::new(search, status, category));
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(hash_of(&a), hash_of(&b));
            prop_assert_eq!(a.to_string(), b.to_string());
        }

        #[test]
        fn keys_differ_when_any_component_differs(
            page in 1u32..500,
            search in "[a-z]{0,8}",
            status in status_strategy(),
        ) {
            let triple = SelectionTriple::new(search.clone(), status, CategoryFilter::All);
            let key = CacheKey::new(page, triple.clone());
            prop_assert_ne!(&key, &CacheKey::new(page + 1, triple.clone()));
            prop_assert_ne!(&key, &CacheKey::new(page, triple.with_search(format!("{search}!"))));
            prop_assert_ne!(
                &key,
                &CacheKey::new(page, triple.with_category(CategoryFilter::Industry("x".into())))
            );
        }
    }
}
