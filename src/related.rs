use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::{CategoryType, QueryScope};
use crate::error::QuoteError;
use crate::library::QuoteLibrary;
use crate::quote::Quote;
use crate::slug::slugify;

/// A cross-link computed on demand: an author under a topic, or a topic an
/// author (movie, book, show) is quoted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub category: CategoryType,
    /// Quotes linking the two entities.
    pub count: usize,
    pub slug: String,
}

impl QuoteLibrary {
    /// Related entities for the page of `name` under `scope`.
    ///
    /// Topics tally the authors of `quotes`. Authors, movies, books and shows
    /// scan the whole topic partition for quotes attributed to `name`
    /// (compared by slug); that scan is memoized per `(type, name)`. Every
    /// other scope has no related entities.
    pub fn related_entities(
        &self,
        scope: QueryScope,
        name: &str,
        quotes: &[Quote],
    ) -> Result<Vec<RelatedEntity>, QuoteError> {
        match scope.category() {
            Some(CategoryType::Topic) => Ok(self.authors_in_topic(quotes)),
            Some(category) if category.has_reverse_topics() => self.topics_for(category, name),
            _ => Ok(Vec::new()),
        }
    }

    fn authors_in_topic(&self, quotes: &[Quote]) -> Vec<RelatedEntity> {
        let tally = rank(quotes.iter().map(|quote| quote.author.as_str()));
        tally
            .into_iter()
            .take(self.config.topic_author_limit)
            .map(|(name, count)| RelatedEntity {
                slug: slugify(name),
                name: name.to_string(),
                category: CategoryType::Author,
                count,
            })
            .collect()
    }

    fn topics_for(&self, category: CategoryType, name: &str) -> Result<Vec<RelatedEntity>, QuoteError> {
        let cache_key = (category, name.to_string());
        if let Some(hit) = self.related_cache.lock().get(&cache_key) {
            return Ok(hit.clone());
        }

        let target = slugify(name);
        let related = if target.is_empty() {
            Vec::new()
        } else {
            let topics = self.store.partition(CategoryType::Topic)?;
            let mut counted: Vec<(usize, RelatedEntity)> = topics
                .sources()
                .iter()
                .enumerate()
                .filter_map(|(position, topic)| {
                    let count = topic
                        .quotes()
                        .iter()
                        .filter(|quote| slugify(&quote.author) == target)
                        .count();
                    (count > 0).then(|| {
                        let entity = RelatedEntity {
                            name: topic.key().to_string(),
                            category: CategoryType::Topic,
                            count,
                            slug: topic.route_slug().to_string(),
                        };
                        (position, entity)
                    })
                })
                .collect();
            counted.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));
            counted
                .into_iter()
                .take(self.config.reverse_topic_limit)
                .map(|(_, entity)| entity)
                .collect()
        };
        debug!(%category, name, topics = related.len(), "Computed reverse topic scan");

        self.related_cache.lock().put(cache_key, related.clone());
        Ok(related)
    }
}

/// Distinct values by descending count; ties keep first-seen order.
fn rank<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in values {
        match index.get(value) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(value, order.len());
                order.push((value, 1));
            }
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}
