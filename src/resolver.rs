use tracing::debug;

use crate::category::{CategoryType, QueryScope};
use crate::error::QuoteError;
use crate::library::QuoteLibrary;
use crate::quote::{Quote, flatten};
use crate::search::{SearchField, any_term_filter, fuzzy_rank, split_terms, substring_filter};
use crate::slug::{find_key_by_slug, slugify};
use crate::store::CategoryMap;

impl QuoteLibrary {
    /// Resolves a free-text query, slug or `|`-separated term list.
    ///
    /// * `a|b|c` returns every quote containing any term, in dataset order.
    /// * On a category scope, a query that names a source (by key or slug)
    ///   returns all of that source's quotes.
    /// * Anything else is fuzzy-ranked over text, author and category (only
    ///   category and author on a category scope), falling back to a plain
    ///   substring match when nothing scores.
    ///
    /// A blank query returns an empty list without touching the dataset.
    pub fn resolve_query(&self, query: &str, scope: QueryScope) -> Result<Vec<Quote>, QuoteError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let quotes = match split_terms(query) {
            Some(terms) => {
                debug!(%scope, terms = terms.len(), "Resolving multi-term query");
                any_term_filter(self.scope_quotes(scope)?, &terms)
            }
            None => self.resolve_single(query, scope)?,
        };
        Ok(quotes.into_iter().map(Quote::with_image).collect())
    }

    fn resolve_single(&self, query: &str, scope: QueryScope) -> Result<Vec<Quote>, QuoteError> {
        if let Some(category) = scope.category() {
            let map = self.store.partition(category)?;
            if let Some(key) = source_key_for_query(map, query) {
                debug!(%scope, key, "Query names a source");
                return Ok(flatten(map, Some(key)));
            }
        }

        let fields = match scope {
            QueryScope::Search => SearchField::ALL,
            QueryScope::Category(_) => SearchField::TITLES,
        };
        let pool = self.scope_quotes(scope)?;
        let ranked = fuzzy_rank(&pool, query, fields, &self.config.search);
        if !ranked.is_empty() {
            debug!(%scope, hits = ranked.len(), "Fuzzy match");
            return Ok(ranked);
        }
        let literal = substring_filter(&pool, query, fields);
        debug!(%scope, hits = literal.len(), "Fuzzy match empty; used substring fallback");
        Ok(literal)
    }

    /// Every quote a scope covers: one partition, or the merged search sources.
    pub(crate) fn scope_quotes(&self, scope: QueryScope) -> Result<Vec<Quote>, QuoteError> {
        match scope {
            QueryScope::Category(category) => Ok(flatten(self.store.partition(category)?, None)),
            QueryScope::Search => {
                let mut quotes = Vec::new();
                for category in CategoryType::SEARCH_SOURCES {
                    quotes.extend(flatten(self.store.partition(category)?, None));
                }
                Ok(quotes)
            }
        }
    }
}

fn source_key_for_query<'a>(map: &'a CategoryMap, query: &str) -> Option<&'a str> {
    find_key_by_slug(map, query).or_else(|| find_key_by_slug(map, &slugify(query)))
}
