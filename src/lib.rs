mod data;

mod browse;
mod category;
mod detail;
mod error;
mod library;
mod quote;
mod related;
mod resolver;
mod search;
mod slug;
mod store;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "web")]
pub mod web;

pub use browse::{SourceSummary, Suggestion, today};
pub use category::{CategoryType, QueryScope};
pub use data::{DailyRecord, RawQuote, SourceRecord};
pub use detail::QuoteDetail;
pub use error::QuoteError;
pub use library::{LibraryConfig, QuoteLibrary};
pub use quote::{Quote, avatar_url, flatten, flatten_source, image_url};
pub use related::RelatedEntity;
pub use search::{
    FuzzyMatcher, SearchConfig, SearchField, any_term_filter, fuzzy_rank, split_terms,
    substring_filter,
};
pub use slug::{find_key_by_slug, slugify, unslugify};
pub use store::{
    CategoryMap, DatasetStore, EmbeddedLoader, Extras, JsonDirLoader, MemoryLoader,
    PartitionLoader, SlugCollision, SourceEntry,
};
