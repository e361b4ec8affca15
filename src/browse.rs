use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::category::CategoryType;
use crate::error::QuoteError;
use crate::library::QuoteLibrary;
use crate::quote::{Quote, flatten_source};
use crate::search::FuzzyMatcher;
use crate::store::SourceEntry;

const SECONDS_PER_DAY: u64 = 86_400;

/// One row of a category directory page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub slug: String,
    pub count: usize,
    /// Index letter: uppercase first ASCII letter, `#` otherwise.
    pub letter: char,
}

impl SourceSummary {
    fn from_source(source: &SourceEntry) -> Self {
        Self {
            name: source.key().to_string(),
            slug: source.route_slug().to_string(),
            count: source.len(),
            letter: index_letter(source.key()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub category: CategoryType,
    pub slug: String,
    pub count: usize,
}

fn index_letter(name: &str) -> char {
    match name.trim_start().chars().next() {
        Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
        _ => '#',
    }
}

/// Days since the Unix epoch, the seed for [`QuoteLibrary::daily_quote`].
pub fn today() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() / SECONDS_PER_DAY)
        .unwrap_or(0)
}

impl QuoteLibrary {
    /// Sources of a category in dataset order, or the sources whose slug
    /// starts with `prefix` in slug order.
    pub fn directory(
        &self,
        category: CategoryType,
        prefix: Option<&str>,
    ) -> Result<Vec<SourceSummary>, QuoteError> {
        let map = self.store.partition(category)?;
        let summaries = match prefix {
            Some(prefix) => map
                .sources_with_slug_prefix(prefix, usize::MAX)
                .into_iter()
                .map(SourceSummary::from_source)
                .collect(),
            None => map.sources().iter().map(SourceSummary::from_source).collect(),
        };
        Ok(summaries)
    }

    /// Fuzzy-matches source names across every category, best first.
    pub fn autocomplete(&self, query: &str, limit: Option<usize>) -> Result<Vec<Suggestion>, QuoteError> {
        let Some(matcher) = FuzzyMatcher::new(query, &self.config.search) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<(f64, Suggestion)> = Vec::new();
        for category in CategoryType::ALL {
            let map = self.store.partition(category)?;
            scored.extend(map.sources().iter().filter_map(|source| {
                let score = matcher.score(source.key())?;
                Some((
                    score,
                    Suggestion {
                        name: source.key().to_string(),
                        category,
                        slug: source.route_slug().to_string(),
                        count: source.len(),
                    },
                ))
            }));
        }
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        let limit = limit.unwrap_or(self.config.autocomplete_limit);
        debug!(query, candidates = scored.len(), limit, "Autocomplete");
        Ok(scored.into_iter().take(limit).map(|(_, s)| s).collect())
    }

    /// The quote of the day for `day` (see [`today`]). `None` when the pool
    /// is empty.
    pub fn daily_quote(&self, day: u64) -> Result<Option<Quote>, QuoteError> {
        let pool = self.store.extras()?.daily_pool();
        if pool.is_empty() {
            return Ok(None);
        }
        let record = &pool[(day % pool.len() as u64) as usize];
        Ok(Some(
            Quote {
                id: record.id.clone(),
                text: record.text.clone(),
                author: record.author.clone(),
                category: record.category.clone(),
                image_url: None,
            }
            .with_image(),
        ))
    }

    /// Resolves saved quote ids, skipping ids that no longer resolve.
    /// Input order is kept and duplicates are returned once.
    pub fn quotes_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Quote>, QuoteError> {
        let mut found: Vec<Quote> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref().trim();
            if found.iter().any(|quote| quote.id == id) {
                continue;
            }
            match self.quote_by_id(id)? {
                Some(quote) => found.push(quote.with_image()),
                None => debug!(id, "Skipping stale quote id"),
            }
        }
        Ok(found)
    }

    /// Looks up one minted id: `{type}_{slug}_{index}`, else the single-entry
    /// form `{type}_{slug}`.
    pub fn quote_by_id(&self, id: &str) -> Result<Option<Quote>, QuoteError> {
        let Some((prefix, rest)) = id.split_once('_') else {
            return Ok(None);
        };
        let Ok(category) = prefix.parse::<CategoryType>() else {
            return Ok(None);
        };
        let map = self.store.partition(category)?;

        let indexed = rest
            .rsplit_once('_')
            .filter(|(_, index)| index.parse::<usize>().is_ok())
            .map(|(slug, _)| slug);
        let quote = indexed
            .into_iter()
            .chain(std::iter::once(rest))
            .filter_map(|slug| map.source_by_slug(slug))
            .find_map(|source| flatten_source(category, source).find(|quote| quote.id == id));
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, STAY_HUNGRY};
    use crate::store::MemoryLoader;

    #[test]
    fn directory_lists_sources_in_dataset_order() {
        let library = fixtures::library();
        let movies = library.directory(CategoryType::Movie, None).unwrap();
        assert_eq!(
            movies,
            [
                SourceSummary {
                    name: "The Godfather".to_string(),
                    slug: "the-godfather".to_string(),
                    count: 2,
                    letter: 'T',
                },
                SourceSummary {
                    name: "Ferris Bueller's Day Off".to_string(),
                    slug: "ferris-buellers-day-off".to_string(),
                    count: 1,
                    letter: 'F',
                },
            ]
        );
    }

    #[test]
    fn directory_prefix_uses_slug_order() {
        let library = QuoteLibrary::new(MemoryLoader::new().with_sources(
            CategoryType::Game,
            vec![
                ("Portal 2", vec![("The cake is a lie.", "GLaDOS")]),
                ("Halo", vec![("Wake me when you need me.", "Master Chief")]),
                ("Portal", vec![("Still alive.", "GLaDOS")]),
                ("2048", vec![("Just one more.", "Anonymous")]),
            ],
        ));
        let names: Vec<_> = library
            .directory(CategoryType::Game, Some("portal"))
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Portal", "Portal 2"]);
        let all = library.directory(CategoryType::Game, None).unwrap();
        assert_eq!(all[3].letter, '#');
        assert!(library.directory(CategoryType::Game, Some("zelda")).unwrap().is_empty());
    }

    #[test]
    fn autocomplete_spans_categories() {
        let library = fixtures::library();
        let suggestions = library.autocomplete("godfather", None).unwrap();
        assert_eq!(suggestions[0].name, "The Godfather");
        assert_eq!(suggestions[0].category, CategoryType::Movie);
        assert_eq!(suggestions[0].slug, "the-godfather");
        assert_eq!(suggestions[0].count, 2);

        let typo = library.autocomplete("stve jobs", None).unwrap();
        assert_eq!(typo[0].name, "Steve Jobs");
        assert_eq!(typo[0].category, CategoryType::Author);
    }

    #[test]
    fn autocomplete_ignores_short_queries_and_honours_limit() {
        let library = fixtures::library();
        assert!(library.autocomplete("s", None).unwrap().is_empty());
        assert!(library.autocomplete("", None).unwrap().is_empty());
        let limited = library.autocomplete("o", Some(1)).unwrap();
        assert!(limited.is_empty());
        let limited = library.autocomplete("love", Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].category, CategoryType::Topic);
    }

    #[test]
    fn daily_quote_cycles_through_pool() {
        let library = fixtures::library();
        let first = library.daily_quote(0).unwrap().unwrap();
        let second = library.daily_quote(1).unwrap().unwrap();
        assert_eq!(first.id, "dq_1");
        assert_eq!(second.id, "dq_2");
        assert_eq!(library.daily_quote(2).unwrap().unwrap(), first);
        assert!(first.image_url.is_some());

        let empty = QuoteLibrary::new(MemoryLoader::new());
        assert_eq!(empty.daily_quote(today()).unwrap(), None);
    }

    #[test]
    fn today_counts_days_since_epoch() {
        // 2024-01-01 is day 19723.
        assert!(today() > 19_723);
    }

    #[test]
    fn favorites_resolve_minted_ids() {
        let library = fixtures::library();
        let ids = [
            "movie_the-godfather_1",
            "author_steve-jobs_0",
            "proverb_irish-blessing",
            "author_steve-jobs_9",
            "author_steve-jobs_0",
            "planet_earth_0",
            "nonsense",
            "topic_",
        ];
        let quotes = library.quotes_by_ids(&ids).unwrap();
        let found: Vec<_> = quotes.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(
            found,
            ["movie_the-godfather_1", "author_steve-jobs_0", "proverb_irish-blessing"]
        );
        assert_eq!(quotes[1].text, STAY_HUNGRY);
        assert!(quotes.iter().all(|q| q.image_url.is_some()));
    }

    #[test]
    fn favorites_round_trip_every_id() {
        let library = fixtures::library();
        for category in CategoryType::ALL {
            let map = library.store().partition(category).unwrap();
            for source in map.sources() {
                for quote in flatten_source(category, source) {
                    let resolved = library.quote_by_id(&quote.id).unwrap();
                    assert_eq!(resolved.as_ref(), Some(&quote), "{}", quote.id);
                }
            }
        }
    }

    #[test]
    fn favorites_handle_underscored_slugs_and_route_slugs() {
        let library = QuoteLibrary::new(MemoryLoader::new().with_sources(
            CategoryType::Tv,
            vec![
                ("snake_case 3", vec![("First.", "A"), ("Second.", "B")]),
                ("Snake_Case  3", vec![("Third.", "C")]),
            ],
        ));
        let quotes = library
            .quotes_by_ids(&["tv_snake_case-3_1", "tv_snake_case-3-2_0"])
            .unwrap();
        let texts: Vec<_> = quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["Second.", "Third."]);
    }

    #[test]
    fn index_letter_falls_back_to_hash() {
        assert_eq!(index_letter("rumi"), 'R');
        assert_eq!(index_letter("  Émile"), '#');
        assert_eq!(index_letter("2001: A Space Odyssey"), '#');
        assert_eq!(index_letter(""), '#');
    }
}
