use rapidfuzz::distance::levenshtein;
use rayon::prelude::*;

use crate::quote::Quote;

/// Tuning for approximate matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Highest normalized edit distance (0.0 exact, 1.0 unrelated) that still
    /// counts as a match.
    pub threshold: f64,
    /// Queries with fewer significant characters never fuzzy-match.
    pub min_match_len: usize,
    pub limit: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_match_len: 2,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Text,
    Author,
    Category,
}

impl SearchField {
    pub const ALL: &'static [SearchField] =
        &[SearchField::Text, SearchField::Author, SearchField::Category];
    /// Title-like fields, for category pages where the query names a source.
    pub const TITLES: &'static [SearchField] = &[SearchField::Category, SearchField::Author];

    pub fn value(self, quote: &Quote) -> &str {
        match self {
            SearchField::Text => &quote.text,
            SearchField::Author => &quote.author,
            SearchField::Category => &quote.category,
        }
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn sorted_join(tokens: &[String]) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

fn distance(a: &str, b: &str) -> f64 {
    levenshtein::normalized_distance(a.chars(), b.chars())
}

/// Scores haystacks against one query.
///
/// A haystack matches when the query appears anywhere in it, either as a
/// literal run of words or within `threshold` edit distance of a window of
/// words around the query's length. Whole-field and word-order-insensitive
/// comparisons catch short fields such as names.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    joined: String,
    sorted: String,
    width: usize,
    len: usize,
    threshold: f64,
}

impl FuzzyMatcher {
    /// Returns `None` when the query is too short to match anything.
    pub fn new(query: &str, config: &SearchConfig) -> Option<Self> {
        let tokens = tokens(query);
        let joined = tokens.join(" ");
        let len = joined.chars().count();
        if tokens.is_empty() || len < config.min_match_len {
            return None;
        }
        Some(Self {
            sorted: sorted_join(&tokens),
            width: tokens.len(),
            len,
            joined,
            threshold: config.threshold,
        })
    }

    /// Best (lowest) distance for the haystack, if within threshold.
    pub fn score(&self, haystack: &str) -> Option<f64> {
        let field = tokens(haystack);
        if field.is_empty() {
            return None;
        }
        let whole = field.join(" ");
        if whole.contains(&self.joined) {
            return Some(0.0);
        }

        let mut best = distance(&self.joined, &whole);
        for span in [self.width.saturating_sub(1).max(1), self.width, self.width + 1] {
            if span >= field.len() {
                continue;
            }
            for window in field.windows(span) {
                let candidate = window.join(" ");
                if self.length_gap(&candidate) > self.threshold {
                    continue;
                }
                best = best.min(distance(&self.joined, &candidate));
            }
        }
        if field.len() > 1 && field.len() <= self.width + 1 {
            best = best.min(distance(&self.sorted, &sorted_join(&field)));
        }

        (best <= self.threshold).then_some(best)
    }

    fn length_gap(&self, candidate: &str) -> f64 {
        let other = candidate.chars().count();
        let longest = other.max(self.len) as f64;
        other.abs_diff(self.len) as f64 / longest
    }
}

/// Ranks quotes by fuzzy match quality over `fields`, best first. Ties keep
/// input order. Non-matching quotes are dropped.
pub fn fuzzy_rank(
    quotes: &[Quote],
    query: &str,
    fields: &[SearchField],
    config: &SearchConfig,
) -> Vec<Quote> {
    let Some(matcher) = FuzzyMatcher::new(query, config) else {
        return Vec::new();
    };
    let mut scored: Vec<(f64, &Quote)> = quotes
        .par_iter()
        .filter_map(|quote| {
            let best = fields
                .iter()
                .filter_map(|field| matcher.score(field.value(quote)))
                .min_by(f64::total_cmp)?;
            Some((best, quote))
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    let limit = config.limit.unwrap_or(usize::MAX);
    scored
        .into_iter()
        .take(limit)
        .map(|(_, quote)| quote.clone())
        .collect()
}

/// Case-insensitive substring filter over `fields`, in input order.
pub fn substring_filter(quotes: &[Quote], query: &str, fields: &[SearchField]) -> Vec<Quote> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    quotes
        .iter()
        .filter(|quote| {
            fields
                .iter()
                .any(|field| field.value(quote).to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Splits a `|`-delimited query into lowercase terms. `None` when the query
/// has no delimiter.
pub fn split_terms(query: &str) -> Option<Vec<String>> {
    if !query.contains('|') {
        return None;
    }
    Some(
        query
            .split('|')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect(),
    )
}

/// Keeps quotes whose text, author or category contains any of `terms`.
pub fn any_term_filter(quotes: Vec<Quote>, terms: &[String]) -> Vec<Quote> {
    quotes
        .into_iter()
        .filter(|quote| {
            SearchField::ALL.iter().any(|field| {
                let value = field.value(quote).to_lowercase();
                terms.iter().any(|term| value.contains(term.as_str()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(id: &str, text: &str, author: &str, category: &str) -> Quote {
        Quote {
            id: id.to_string(),
            text: text.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            image_url: None,
        }
    }

    fn sample() -> Vec<Quote> {
        vec![
            quote("a", "Stay hungry, stay foolish.", "Steve Jobs", "Steve Jobs"),
            quote("b", "Hope is a waking dream.", "Aristotle", "Hope"),
            quote("c", "Love all, trust a few.", "William Shakespeare", "Love"),
            quote("d", "I'm gonna make him an offer he can't refuse.", "Vito Corleone", "The Godfather"),
        ]
    }

    fn ids(quotes: &[Quote]) -> Vec<&str> {
        quotes.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn matcher_requires_two_characters() {
        let config = SearchConfig::default();
        assert!(FuzzyMatcher::new("a", &config).is_none());
        assert!(FuzzyMatcher::new("  !! ", &config).is_none());
        assert!(FuzzyMatcher::new("ab", &config).is_some());
    }

    #[test]
    fn matcher_tolerates_typos_anywhere_in_field() {
        let matcher = FuzzyMatcher::new("stay hungri", &SearchConfig::default()).unwrap();
        let score = matcher.score("Stay hungry, stay foolish.").unwrap();
        assert!(score > 0.0 && score <= 0.3);

        let matcher = FuzzyMatcher::new("shakespere", &SearchConfig::default()).unwrap();
        assert!(matcher.score("William Shakespeare").is_some());
    }

    #[test]
    fn matcher_tolerates_word_order() {
        let matcher = FuzzyMatcher::new("jobs steve", &SearchConfig::default()).unwrap();
        assert_eq!(matcher.score("Steve Jobs"), Some(0.0));
    }

    #[test]
    fn matcher_rejects_unrelated_text() {
        let matcher = FuzzyMatcher::new("godfather", &SearchConfig::default()).unwrap();
        assert!(matcher.score("Hope is a waking dream.").is_none());
        assert!(matcher.score("").is_none());
    }

    #[test]
    fn fuzzy_rank_orders_best_first() {
        let quotes = vec![
            quote("typo", "Hopw springs eternal.", "Alexander Pope", "Hope"),
            quote("exact", "Hope is a waking dream.", "Aristotle", "Wisdom"),
        ];
        let config = SearchConfig::default();
        let ranked = fuzzy_rank(&quotes, "hope is", &[SearchField::Text], &config);
        assert_eq!(ids(&ranked), ["exact"]);

        let ranked = fuzzy_rank(&sample(), "godfathr", SearchField::ALL, &config);
        assert_eq!(ids(&ranked), ["d"]);
    }

    #[test]
    fn fuzzy_rank_honours_limit_and_field_choice() {
        let config = SearchConfig {
            limit: Some(1),
            ..SearchConfig::default()
        };
        let ranked = fuzzy_rank(&sample(), "love", SearchField::ALL, &config);
        assert_eq!(ids(&ranked), ["c"]);
        let ranked = fuzzy_rank(&sample(), "foolish", SearchField::TITLES, &SearchConfig::default());
        assert!(ranked.is_empty());
    }

    #[test]
    fn substring_filter_is_case_insensitive() {
        let found = substring_filter(&sample(), "CAN'T REFUSE", SearchField::ALL);
        assert_eq!(ids(&found), ["d"]);
        assert!(substring_filter(&sample(), "   ", SearchField::ALL).is_empty());
    }

    #[test]
    fn split_terms_only_for_pipe_queries() {
        assert_eq!(split_terms("love"), None);
        assert_eq!(
            split_terms("Love| Hope ||"),
            Some(vec!["love".to_string(), "hope".to_string()])
        );
    }

    #[test]
    fn any_term_filter_is_a_union_in_input_order() {
        let terms = split_terms("Love|Hope").unwrap();
        let found = any_term_filter(sample(), &terms);
        assert_eq!(ids(&found), ["b", "c"]);
        for quote in &found {
            let haystack = format!("{} {} {}", quote.text, quote.author, quote.category).to_lowercase();
            assert!(terms.iter().any(|t| haystack.contains(t.as_str())));
        }
    }
}
