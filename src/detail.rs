use serde::Serialize;
use tracing::warn;

use crate::category::CategoryType;
use crate::error::QuoteError;
use crate::library::QuoteLibrary;
use crate::quote::{Quote, flatten};
use crate::slug::{find_key_by_slug, slugify};

/// One quote page: the quote, its siblings from the same source and an
/// optional bio of the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuoteDetail {
    pub quote: Option<Quote>,
    pub related: Vec<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl QuoteDetail {
    pub fn is_found(&self) -> bool {
        self.quote.is_some()
    }
}

impl QuoteLibrary {
    /// Resolves `/{type}/{source_slug}/{quote_slug}`.
    ///
    /// An unknown source or quote yields an empty detail rather than an
    /// error; only a failed partition load is an `Err`.
    pub fn resolve_detail(
        &self,
        category: CategoryType,
        source_slug: &str,
        quote_slug: &str,
    ) -> Result<QuoteDetail, QuoteError> {
        let map = self.store.partition(category)?;
        let Some(key) = find_key_by_slug(map, source_slug) else {
            return Ok(QuoteDetail::default());
        };
        let mut quotes = flatten(map, Some(key));
        let Some(position) = quotes.iter().position(|quote| slugify(&quote.text) == quote_slug) else {
            return Ok(QuoteDetail::default());
        };

        let quote = quotes.remove(position).with_image();
        let related = quotes
            .into_iter()
            .take(self.config.detail_related_limit)
            .map(Quote::with_image)
            .collect();
        Ok(QuoteDetail {
            quote: Some(quote),
            related,
            bio: self.bio(category, key),
        })
    }

    /// Bio for an author or topic page. Side-table failures degrade to no bio.
    pub fn bio(&self, category: CategoryType, name: &str) -> Option<String> {
        match self.store.extras() {
            Ok(extras) => extras.bio(category, name).map(str::to_string),
            Err(err) => {
                warn!(%category, name, "Bio lookup skipped: {err}");
                None
            }
        }
    }
}
