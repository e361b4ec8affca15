use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::category::CategoryType;
use crate::slug::slugify;
use crate::store::{CategoryMap, SourceEntry};

const SEED_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub text: String,
    pub author: String,
    /// The source key the quote was listed under, verbatim.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Quote {
    /// Fills in the placeholder image derived from the id, keeping any URL
    /// that is already set.
    pub fn with_image(mut self) -> Self {
        if self.image_url.is_none() {
            self.image_url = Some(image_url(&self.id));
        }
        self
    }

    /// Slug of the quote text; the last segment of a detail link.
    pub fn slug(&self) -> String {
        slugify(&self.text)
    }
}

/// Deterministic placeholder background keyed by quote id.
pub fn image_url(seed: &str) -> String {
    format!(
        "https://picsum.photos/seed/{}/800/600?grayscale&blur=2",
        utf8_percent_encode(seed, SEED_ESCAPES)
    )
}

pub fn avatar_url(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random&color=fff",
        utf8_percent_encode(name, NON_ALPHANUMERIC)
    )
}

/// Flattens a category map into quotes, optionally restricted to one key.
///
/// This is where quote ids are minted: `{type}_{slug}_{index}`, or
/// `{type}_{slug}` for sources stored as a single entry. `slug` is the
/// source's route slug, so keys sharing a slug still get distinct ids.
pub fn flatten(map: &CategoryMap, restrict_to_key: Option<&str>) -> Vec<Quote> {
    map.sources()
        .iter()
        .filter(|source| restrict_to_key.is_none_or(|key| source.key() == key))
        .flat_map(|source| flatten_source(map.category(), source))
        .collect()
}

pub fn flatten_source(
    category: CategoryType,
    source: &SourceEntry,
) -> impl Iterator<Item = Quote> + '_ {
    source.quotes().iter().enumerate().map(move |(index, raw)| {
        let index = (!source.is_single()).then_some(index);
        Quote {
            id: quote_id(category, source.route_slug(), index),
            text: raw.text.clone(),
            author: raw.author.clone(),
            category: source.key().to_string(),
            image_url: None,
        }
    })
}

/// `{type}_{slug}_{index}`, or `{type}_{slug}` for a single entry.
pub(crate) fn quote_id(category: CategoryType, route_slug: &str, index: Option<usize>) -> String {
    match index {
        Some(index) => format!("{category}_{route_slug}_{index}"),
        None => format!("{category}_{route_slug}"),
    }
}
