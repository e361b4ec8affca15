use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// The top-level grouping a source key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Author,
    Topic,
    Movie,
    Tv,
    Book,
    Game,
    Lyrics,
    Anime,
    Poetry,
    Proverb,
}

impl CategoryType {
    pub const COUNT: usize = 10;

    pub const ALL: [CategoryType; Self::COUNT] = [
        CategoryType::Author,
        CategoryType::Topic,
        CategoryType::Movie,
        CategoryType::Tv,
        CategoryType::Book,
        CategoryType::Game,
        CategoryType::Lyrics,
        CategoryType::Anime,
        CategoryType::Poetry,
        CategoryType::Proverb,
    ];

    /// Types merged into a global `search` query, in result order.
    pub const SEARCH_SOURCES: [CategoryType; 4] = [
        CategoryType::Topic,
        CategoryType::Author,
        CategoryType::Movie,
        CategoryType::Book,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Author => "author",
            CategoryType::Topic => "topic",
            CategoryType::Movie => "movie",
            CategoryType::Tv => "tv",
            CategoryType::Book => "book",
            CategoryType::Game => "game",
            CategoryType::Lyrics => "lyrics",
            CategoryType::Anime => "anime",
            CategoryType::Poetry => "poetry",
            CategoryType::Proverb => "proverb",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Whether an author-like name on this type's pages links back to topics.
    pub fn has_reverse_topics(self) -> bool {
        matches!(
            self,
            CategoryType::Author | CategoryType::Movie | CategoryType::Book | CategoryType::Tv
        )
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = QuoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        CategoryType::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| QuoteError::InvalidCategory(value.to_string()))
    }
}

/// What a query runs against: one category type, or the aggregated global
/// search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryScope {
    #[default]
    Search,
    Category(CategoryType),
}

impl QueryScope {
    pub fn category(self) -> Option<CategoryType> {
        match self {
            QueryScope::Search => None,
            QueryScope::Category(category) => Some(category),
        }
    }
}

impl From<CategoryType> for QueryScope {
    fn from(value: CategoryType) -> Self {
        QueryScope::Category(value)
    }
}

impl fmt::Display for QueryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryScope::Search => f.write_str("search"),
            QueryScope::Category(category) => fmt::Display::fmt(category, f),
        }
    }
}

impl FromStr for QueryScope {
    type Err = QuoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("search") {
            return Ok(QueryScope::Search);
        }
        value.parse().map(QueryScope::Category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_recognized_type() {
        for category in CategoryType::ALL {
            let parsed: CategoryType = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!("search".parse::<QueryScope>().unwrap(), QueryScope::Search);
        assert_eq!(
            " TV ".parse::<QueryScope>().unwrap(),
            QueryScope::Category(CategoryType::Tv)
        );
    }

    #[test]
    fn rejects_unknown_type() {
        let err = "podcast".parse::<QueryScope>().unwrap_err();
        assert!(matches!(err, QuoteError::InvalidCategory(ref name) if name == "podcast"));
    }

    #[test]
    fn reverse_topic_types() {
        let reverse: Vec<_> = CategoryType::ALL
            .into_iter()
            .filter(|c| c.has_reverse_topics())
            .collect();
        assert_eq!(
            reverse,
            [
                CategoryType::Author,
                CategoryType::Movie,
                CategoryType::Tv,
                CategoryType::Book
            ]
        );
    }
}
