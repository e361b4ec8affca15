use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::PathBuf;

use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Map, Streamer};
use once_cell::sync::OnceCell;
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use tracing::{debug, warn};
use zstd::stream::decode_all;

use crate::category::CategoryType;
use crate::data::{
    DailyRecord, ExtrasRecord, PartitionRecord, RawQuote, SourceRecord, parse_extras,
    parse_partition,
};
use crate::error::QuoteError;
use crate::quote::quote_id;
use crate::slug::slugify;

/// One source key and its quotes.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    key: String,
    slug: String,
    route_slug: String,
    quotes: Vec<RawQuote>,
    single: bool,
}

impl SourceEntry {
    /// The human-readable key, exactly as written in the dataset.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Slug used in quote ids and links. Equal to [`slug`](Self::slug) unless
    /// an earlier key already claimed that slug or the ids it would mint, in
    /// which case a `-2`, `-3`, ... suffix keeps it unique within the category.
    pub fn route_slug(&self) -> &str {
        &self.route_slug
    }

    pub fn quotes(&self) -> &[RawQuote] {
        &self.quotes
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Two source keys that slugify to the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugCollision {
    pub slug: String,
    pub kept: String,
    pub shadowed: String,
    pub route_slug: String,
}

/// Immutable source-key to quotes table for one category type, with a slug
/// index over its keys.
pub struct CategoryMap {
    category: CategoryType,
    sources: Vec<SourceEntry>,
    by_key: HashMap<String, usize>,
    slug_index: Map<Vec<u8>>,
    collisions: Vec<SlugCollision>,
}

impl CategoryMap {
    pub fn new(category: CategoryType, records: Vec<SourceRecord>) -> Self {
        let slugs: Vec<String> = records.iter().map(|record| slugify(&record.key)).collect();

        // Real slugs are reserved up front so a suffix never claims one.
        let mut positions: BTreeMap<String, u64> = BTreeMap::new();
        for (idx, slug) in slugs.iter().enumerate() {
            positions.entry(slug.clone()).or_insert(idx as u64);
        }

        let mut by_key = HashMap::with_capacity(records.len());
        let mut sources: Vec<SourceEntry> = Vec::with_capacity(records.len());
        let mut collisions = Vec::new();
        let mut minted: HashSet<String> = HashSet::new();

        for (idx, (record, slug)) in records.into_iter().zip(slugs).enumerate() {
            let owner = positions.get(&slug).map_or(idx, |&first| first as usize);
            let route_slug = if owner == idx && ids_are_free(&minted, category, &slug, &record) {
                slug.clone()
            } else {
                let route = suffixed_slug(&positions, &minted, category, &slug, &record);
                positions.insert(route.clone(), idx as u64);
                if owner == idx {
                    warn!(
                        category = %category,
                        key = %record.key,
                        route = %route,
                        "Quote ids repeat an earlier source's; routing under a suffixed slug"
                    );
                } else {
                    collisions.push(SlugCollision {
                        slug: slug.clone(),
                        kept: sources[owner].key.clone(),
                        shadowed: record.key.clone(),
                        route_slug: route.clone(),
                    });
                }
                route
            };
            minted.extend(minted_ids(category, &route_slug, &record));
            by_key.entry(record.key.clone()).or_insert(idx);
            sources.push(SourceEntry {
                key: record.key,
                slug,
                route_slug,
                quotes: record.quotes,
                single: record.single,
            });
        }

        for collision in &collisions {
            warn!(
                category = %category,
                slug = %collision.slug,
                kept = %collision.kept,
                shadowed = %collision.shadowed,
                route = %collision.route_slug,
                "Source keys share a slug; first key wins"
            );
        }

        let slug_index = Map::from_iter(positions).expect("slug positions are sorted and unique");
        Self {
            category,
            sources,
            by_key,
            slug_index,
            collisions,
        }
    }

    pub fn from_partition(category: CategoryType, record: PartitionRecord) -> Self {
        Self::new(category, record.sources)
    }

    pub fn category(&self) -> CategoryType {
        self.category
    }

    /// Sources in dataset order.
    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn quote_count(&self) -> usize {
        self.sources.iter().map(SourceEntry::len).sum()
    }

    pub fn source_by_key(&self, key: &str) -> Option<&SourceEntry> {
        self.by_key.get(key).map(|&idx| &self.sources[idx])
    }

    /// Looks up a source by slug or route slug.
    pub fn source_by_slug(&self, slug: &str) -> Option<&SourceEntry> {
        self.slug_index
            .get(slug)
            .and_then(|idx| self.sources.get(idx as usize))
    }

    /// Sources whose slug starts with `prefix`, in slug order. A source listed
    /// under both its slug and a route slug appears once.
    pub fn sources_with_slug_prefix(&self, prefix: &str, limit: usize) -> Vec<&SourceEntry> {
        let automaton = Str::new(prefix).starts_with();
        let mut stream = self.slug_index.search(automaton).into_stream();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        while let Some((_, idx)) = stream.next() {
            if !seen.insert(idx) {
                continue;
            }
            if let Some(source) = self.sources.get(idx as usize) {
                results.push(source);
            }
            if results.len() >= limit {
                break;
            }
        }
        results
    }

    pub fn slug_collisions(&self) -> &[SlugCollision] {
        &self.collisions
    }
}

fn minted_ids<'a>(
    category: CategoryType,
    route_slug: &'a str,
    record: &'a SourceRecord,
) -> impl Iterator<Item = String> + 'a {
    (0..record.quotes.len())
        .map(move |index| quote_id(category, route_slug, (!record.single).then_some(index)))
}

fn ids_are_free(
    minted: &HashSet<String>,
    category: CategoryType,
    route_slug: &str,
    record: &SourceRecord,
) -> bool {
    minted_ids(category, route_slug, record).all(|id| !minted.contains(&id))
}

/// First `<slug>-<n>` (n >= 2) that no key or earlier suffix holds and whose
/// ids are still unused.
fn suffixed_slug(
    positions: &BTreeMap<String, u64>,
    minted: &HashSet<String>,
    category: CategoryType,
    slug: &str,
    record: &SourceRecord,
) -> String {
    (2..)
        .map(|n| format!("{slug}-{n}"))
        .find(|candidate| {
            !positions.contains_key(candidate) && ids_are_free(minted, category, candidate, record)
        })
        .unwrap_or_else(|| slug.to_string())
}

/// Author/topic bios and the daily quote pool.
#[derive(Debug, Clone, Default)]
pub struct Extras {
    author_bios: HashMap<String, String>,
    topic_bios: HashMap<String, String>,
    daily: Vec<DailyRecord>,
}

impl Extras {
    pub fn from_record(record: ExtrasRecord) -> Self {
        Self {
            author_bios: record.author_bios.into_iter().collect(),
            topic_bios: record.topic_bios.into_iter().collect(),
            daily: record.daily,
        }
    }

    /// Exact-name bio lookup. Only authors and topics carry bios.
    pub fn bio(&self, category: CategoryType, name: &str) -> Option<&str> {
        let table = match category {
            CategoryType::Author => &self.author_bios,
            CategoryType::Topic => &self.topic_bios,
            _ => return None,
        };
        table.get(name).map(String::as_str)
    }

    pub fn daily_pool(&self) -> &[DailyRecord] {
        &self.daily
    }
}

/// Source of category partitions. Implementations are called at most once
/// per category by [`DatasetStore`] unless the load fails.
pub trait PartitionLoader: Send + Sync {
    fn load(&self, category: CategoryType) -> Result<CategoryMap, QuoteError>;

    fn load_extras(&self) -> Result<Extras, QuoteError>;
}

static AUTHOR_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_AUTHOR"));
static TOPIC_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_TOPIC"));
static MOVIE_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_MOVIE"));
static TV_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_TV"));
static BOOK_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_BOOK"));
static GAME_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_GAME"));
static LYRICS_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_LYRICS"));
static ANIME_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_ANIME"));
static POETRY_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_POETRY"));
static PROVERB_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_PROVERB"));
static EXTRAS_BYTES: &[u8] = include_bytes!(env!("MAXIMUS_EXTRAS"));

/// Loads the archives compiled into the binary by `build.rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLoader;

impl EmbeddedLoader {
    fn archive(category: CategoryType) -> &'static [u8] {
        match category {
            CategoryType::Author => AUTHOR_BYTES,
            CategoryType::Topic => TOPIC_BYTES,
            CategoryType::Movie => MOVIE_BYTES,
            CategoryType::Tv => TV_BYTES,
            CategoryType::Book => BOOK_BYTES,
            CategoryType::Game => GAME_BYTES,
            CategoryType::Lyrics => LYRICS_BYTES,
            CategoryType::Anime => ANIME_BYTES,
            CategoryType::Poetry => POETRY_BYTES,
            CategoryType::Proverb => PROVERB_BYTES,
        }
    }
}

fn decompress(label: &str, bytes: &[u8]) -> Result<AlignedVec, QuoteError> {
    let decompressed =
        decode_all(Cursor::new(bytes)).map_err(|err| QuoteError::dataset_load(label, err))?;
    let mut aligned: AlignedVec = AlignedVec::with_capacity(decompressed.len());
    aligned.extend_from_slice(&decompressed);
    Ok(aligned)
}

impl PartitionLoader for EmbeddedLoader {
    fn load(&self, category: CategoryType) -> Result<CategoryMap, QuoteError> {
        let aligned = decompress(category.as_str(), Self::archive(category))?;
        let record = rkyv::from_bytes::<PartitionRecord, RkyvError>(&aligned)
            .map_err(|err| QuoteError::dataset_load(category.as_str(), err))?;
        Ok(CategoryMap::from_partition(category, record))
    }

    fn load_extras(&self) -> Result<Extras, QuoteError> {
        let aligned = decompress("extras", EXTRAS_BYTES)?;
        let record = rkyv::from_bytes::<ExtrasRecord, RkyvError>(&aligned)
            .map_err(|err| QuoteError::dataset_load("extras", err))?;
        Ok(Extras::from_record(record))
    }
}

/// Reads the JSON sources at runtime from `<root>/quotes/<type>.json` and
/// `<root>/extras.json`.
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    root: PathBuf,
}

impl JsonDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PartitionLoader for JsonDirLoader {
    fn load(&self, category: CategoryType) -> Result<CategoryMap, QuoteError> {
        let path = self
            .root
            .join("quotes")
            .join(format!("{}.json", category.as_str()));
        let json = fs::read_to_string(&path).map_err(|err| {
            QuoteError::dataset_load(category.as_str(), format!("{}: {err}", path.display()))
        })?;
        let record = parse_partition(category.as_str(), &json).map_err(|err| {
            QuoteError::dataset_load(category.as_str(), format!("{}: {err}", path.display()))
        })?;
        Ok(CategoryMap::from_partition(category, record))
    }

    fn load_extras(&self) -> Result<Extras, QuoteError> {
        let path = self.root.join("extras.json");
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No extras file; bios and daily pool are empty");
                return Ok(Extras::default());
            }
            Err(err) => return Err(err.into()),
        };
        let record = parse_extras(&json).map_err(|err| {
            QuoteError::dataset_load("extras", format!("{}: {err}", path.display()))
        })?;
        Ok(Extras::from_record(record))
    }
}

/// In-memory fixture data. Categories that were never added load as empty.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    partitions: HashMap<CategoryType, Vec<SourceRecord>>,
    extras: ExtrasRecord,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends sources given as `(key, [(text, author)])`.
    pub fn with_sources<K, Q>(mut self, category: CategoryType, sources: K) -> Self
    where
        K: IntoIterator<Item = (&'static str, Q)>,
        Q: IntoIterator<Item = (&'static str, &'static str)>,
    {
        let records = self.partitions.entry(category).or_default();
        for (key, quotes) in sources {
            records.push(SourceRecord {
                key: key.to_string(),
                quotes: quotes
                    .into_iter()
                    .map(|(text, author)| RawQuote {
                        text: text.to_string(),
                        author: author.to_string(),
                    })
                    .collect(),
                single: false,
            });
        }
        self
    }

    pub fn with_records(mut self, category: CategoryType, records: Vec<SourceRecord>) -> Self {
        self.partitions.entry(category).or_default().extend(records);
        self
    }

    pub fn with_author_bio(mut self, name: &str, bio: &str) -> Self {
        self.extras
            .author_bios
            .push((name.to_string(), bio.to_string()));
        self
    }

    pub fn with_topic_bio(mut self, name: &str, bio: &str) -> Self {
        self.extras
            .topic_bios
            .push((name.to_string(), bio.to_string()));
        self
    }

    pub fn with_daily(mut self, record: DailyRecord) -> Self {
        self.extras.daily.push(record);
        self
    }
}

impl PartitionLoader for MemoryLoader {
    fn load(&self, category: CategoryType) -> Result<CategoryMap, QuoteError> {
        let records = self.partitions.get(&category).cloned().unwrap_or_default();
        Ok(CategoryMap::new(category, records))
    }

    fn load_extras(&self) -> Result<Extras, QuoteError> {
        Ok(Extras::from_record(self.extras.clone()))
    }
}

/// Process-wide dataset: loads each category partition on first use and
/// keeps it for the lifetime of the store. Failed loads are not cached.
pub struct DatasetStore {
    loader: Box<dyn PartitionLoader>,
    partitions: [OnceCell<CategoryMap>; CategoryType::COUNT],
    extras: OnceCell<Extras>,
}

impl DatasetStore {
    pub fn new(loader: impl PartitionLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            partitions: std::array::from_fn(|_| OnceCell::new()),
            extras: OnceCell::new(),
        }
    }

    pub fn embedded() -> Self {
        Self::new(EmbeddedLoader)
    }

    pub fn partition(&self, category: CategoryType) -> Result<&CategoryMap, QuoteError> {
        self.partitions[category.index()].get_or_try_init(|| {
            let map = self.loader.load(category)?;
            debug!(
                category = %category,
                sources = map.len(),
                quotes = map.quote_count(),
                "Loaded quote partition"
            );
            Ok(map)
        })
    }

    pub fn extras(&self) -> Result<&Extras, QuoteError> {
        self.extras.get_or_try_init(|| self.loader.load_extras())
    }

    pub fn is_loaded(&self, category: CategoryType) -> bool {
        self.partitions[category.index()].get().is_some()
    }
}
