use std::num::NonZeroUsize;

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::category::CategoryType;
use crate::related::RelatedEntity;
use crate::search::SearchConfig;
use crate::store::{DatasetStore, EmbeddedLoader, PartitionLoader};

static EMBEDDED: Lazy<QuoteLibrary> = Lazy::new(|| QuoteLibrary::new(EmbeddedLoader));

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub search: SearchConfig,
    /// Entries kept in the reverse topic lookup memo.
    pub related_cache_capacity: usize,
    pub detail_related_limit: usize,
    pub topic_author_limit: usize,
    pub reverse_topic_limit: usize,
    pub autocomplete_limit: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            related_cache_capacity: 256,
            detail_related_limit: 6,
            topic_author_limit: 8,
            reverse_topic_limit: 12,
            autocomplete_limit: 10,
        }
    }
}

/// Entry point for quote lookups over one [`DatasetStore`].
///
/// All operations are read-only over the store; the only interior state is
/// the lazily loaded partitions and the related-entity memo.
pub struct QuoteLibrary {
    pub(crate) store: DatasetStore,
    pub(crate) config: LibraryConfig,
    pub(crate) related_cache: Mutex<LruCache<(CategoryType, String), Vec<RelatedEntity>>>,
}

impl QuoteLibrary {
    pub fn new(loader: impl PartitionLoader + 'static) -> Self {
        Self::with_config(loader, LibraryConfig::default())
    }

    pub fn with_config(loader: impl PartitionLoader + 'static, config: LibraryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.related_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: DatasetStore::new(loader),
            config,
            related_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Shared library over the dataset compiled into the binary.
    pub fn embedded() -> &'static QuoteLibrary {
        &EMBEDDED
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::QueryScope;
    use crate::fixtures;
    use crate::slug::slugify;

    #[test]
    fn embedded_dataset_answers_the_steve_jobs_scenario() {
        let library = QuoteLibrary::embedded();
        let quotes = library
            .resolve_query("steve-jobs", QueryScope::Category(CategoryType::Author))
            .unwrap();
        let first = quotes.first().unwrap();
        assert_eq!(first.id, "author_steve-jobs_0");
        assert_eq!(first.text, "Stay hungry, stay foolish.");
        assert!(quotes.iter().all(|q| q.category == "Steve Jobs"));

        let detail = library
            .resolve_detail(CategoryType::Author, "steve-jobs", &slugify(&first.text))
            .unwrap();
        assert_eq!(detail.quote.as_ref(), Some(first));
        assert_eq!(detail.related.len(), quotes.len() - 1);
    }

    #[test]
    fn embedded_topic_page_lists_rumi_first() {
        let library = QuoteLibrary::embedded();
        let scope = QueryScope::Category(CategoryType::Topic);
        let love = library.resolve_query("love", scope).unwrap();
        let related = library.related_entities(scope, "Love", &love).unwrap();
        assert_eq!(related[0].name, "Rumi");
        assert_eq!(related[0].count, 5);
        assert_eq!(related[1].name, "William Shakespeare");
        assert_eq!(related[1].count, 3);
    }

    #[test]
    fn zero_cache_capacity_still_memoizes_one_entry() {
        let config = LibraryConfig {
            related_cache_capacity: 0,
            ..LibraryConfig::default()
        };
        let library = QuoteLibrary::with_config(fixtures::loader(), config);
        assert_eq!(library.related_cache.lock().cap().get(), 1);
        assert_eq!(library.config().detail_related_limit, 6);
    }

    #[test]
    fn custom_limits_apply() {
        let config = LibraryConfig {
            detail_related_limit: 1,
            topic_author_limit: 2,
            ..LibraryConfig::default()
        };
        let library = QuoteLibrary::with_config(fixtures::loader(), config);
        let scope = QueryScope::Category(CategoryType::Topic);
        let love = library.resolve_query("love", scope).unwrap();
        assert_eq!(library.related_entities(scope, "Love", &love).unwrap().len(), 2);
        let detail = library
            .resolve_detail(CategoryType::Topic, "love", &slugify(&love[0].text))
            .unwrap();
        assert_eq!(detail.related.len(), 1);
    }
}
