use std::collections::BTreeMap;

use rkyv::{Archive, Deserialize, Serialize};

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawQuote {
    pub text: String,
    pub author: String,
}

/// One source key with its quotes, in dataset order.
///
/// `single` marks entries that were written as a bare object instead of a
/// list; they keep the index-free quote id.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub key: String,
    pub quotes: Vec<RawQuote>,
    pub single: bool,
}

#[derive(Archive, Serialize, Deserialize, Debug, Clone, Default)]
pub struct PartitionRecord {
    pub category: String,
    pub sources: Vec<SourceRecord>,
}

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DailyRecord {
    pub id: String,
    pub text: String,
    pub author: String,
    pub category: String,
}

#[derive(Archive, Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExtrasRecord {
    pub author_bios: Vec<(String, String)>,
    pub topic_bios: Vec<(String, String)>,
    pub daily: Vec<DailyRecord>,
}

#[derive(Debug, serde::Deserialize)]
struct QuoteJson {
    text: String,
    author: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum EntryJson {
    Many(Vec<QuoteJson>),
    Single(QuoteJson),
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtrasJson {
    #[serde(default)]
    author_bios: BTreeMap<String, String>,
    #[serde(default)]
    topic_bios: BTreeMap<String, String>,
    #[serde(default)]
    daily: Vec<DailyJson>,
}

#[derive(Debug, serde::Deserialize)]
struct DailyJson {
    id: String,
    text: String,
    author: String,
    category: String,
}

/// Parses a category file: a JSON object from source key to either a list of
/// `{text, author}` entries or a single such entry.
pub fn parse_partition(category: &str, json: &str) -> Result<PartitionRecord, serde_json::Error> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
    let mut sources = Vec::with_capacity(object.len());
    for (key, value) in object {
        let (quotes, single) = match serde_json::from_value::<EntryJson>(value)? {
            EntryJson::Many(list) => (list, false),
            EntryJson::Single(entry) => (vec![entry], true),
        };
        sources.push(SourceRecord {
            key,
            quotes: quotes
                .into_iter()
                .map(|q| RawQuote {
                    text: q.text,
                    author: q.author,
                })
                .collect(),
            single,
        });
    }
    Ok(PartitionRecord {
        category: category.to_string(),
        sources,
    })
}

pub fn parse_extras(json: &str) -> Result<ExtrasRecord, serde_json::Error> {
    let parsed: ExtrasJson = serde_json::from_str(json)?;
    Ok(ExtrasRecord {
        author_bios: parsed.author_bios.into_iter().collect(),
        topic_bios: parsed.topic_bios.into_iter().collect(),
        daily: parsed
            .daily
            .into_iter()
            .map(|d| DailyRecord {
                id: d.id,
                text: d.text,
                author: d.author,
                category: d.category,
            })
            .collect(),
    })
}
