use crate::store::CategoryMap;

/// Converts text into a URL-friendly slug.
///
/// Lowercases and trims, turns whitespace runs into `-`, drops everything
/// outside `[a-z0-9_-]` and collapses repeated hyphens. Non-ASCII letters are
/// dropped rather than transliterated, so `"Amélie"` becomes `"amlie"`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for ch in lowered.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                push_hyphen(&mut slug);
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch == '-' {
            push_hyphen(&mut slug);
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            slug.push(ch);
        }
    }
    slug
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

/// Best-effort display label for a slug (`"steve-jobs"` -> `"Steve Jobs"`).
///
/// Lossy: punctuation and casing inside words are gone. Only meant as a
/// placeholder title until the real source key is known.
pub fn unslugify(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a slug (or an already-canonical key) to the source key it came
/// from. When two keys share a slug the first one in dataset order wins.
pub fn find_key_by_slug<'a>(map: &'a CategoryMap, slug: &str) -> Option<&'a str> {
    if let Some(source) = map.source_by_key(slug) {
        return Some(source.key());
    }
    map.source_by_slug(slug).map(|source| source.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryType;
    use crate::data::{RawQuote, SourceRecord};

    fn source(key: &str) -> SourceRecord {
        SourceRecord {
            key: key.to_string(),
            quotes: vec![RawQuote {
                text: format!("A line from {key}."),
                author: "Someone".to_string(),
            }],
            single: false,
        }
    }

    #[test]
    fn slugify_matches_url_rules() {
        assert_eq!(slugify("Steve Jobs"), "steve-jobs");
        assert_eq!(slugify("Rock & Roll"), "rock-roll");
        assert_eq!(slugify("  Ferris Bueller's Day Off  "), "ferris-buellers-day-off");
        assert_eq!(slugify("Stay hungry, stay foolish."), "stay-hungry-stay-foolish");
        assert_eq!(slugify("Spider-Man:  No Way Home"), "spider-man-no-way-home");
        assert_eq!(slugify("snake_case key"), "snake_case-key");
        assert_eq!(slugify("Amélie"), "amlie");
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn slugify_is_reproducible() {
        let key = "L'Étranger — Camus";
        assert_eq!(slugify(key), slugify(key));
        assert_eq!(slugify(key), "ltranger-camus");
    }

    #[test]
    fn unslugify_title_cases_words() {
        assert_eq!(unslugify("steve-jobs"), "Steve Jobs");
        assert_eq!(unslugify("the-dark-knight"), "The Dark Knight");
        assert_eq!(unslugify(""), "");
    }

    #[test]
    fn find_key_prefers_literal_key_then_slug() {
        let map = CategoryMap::new(
            CategoryType::Movie,
            vec![source("Ferris Bueller's Day Off"), source("The Godfather")],
        );
        assert_eq!(
            find_key_by_slug(&map, "ferris-buellers-day-off"),
            Some("Ferris Bueller's Day Off")
        );
        assert_eq!(find_key_by_slug(&map, "The Godfather"), Some("The Godfather"));
        assert_eq!(find_key_by_slug(&map, "the-godfather-part-ii"), None);
        assert_eq!(find_key_by_slug(&map, ""), None);
    }

    #[test]
    fn every_key_round_trips_through_its_slug() {
        let keys = ["Steve Jobs", "Albert Einstein", "Maya Angelou", "Martin Luther King Jr."];
        let map = CategoryMap::new(
            CategoryType::Author,
            keys.iter().map(|k| source(k)).collect(),
        );
        for key in keys {
            assert_eq!(find_key_by_slug(&map, &slugify(key)), Some(key));
        }
    }

    #[test]
    fn colliding_slugs_resolve_to_first_key() {
        let map = CategoryMap::new(
            CategoryType::Topic,
            vec![source("Rock & Roll"), source("Rock Roll")],
        );
        assert_eq!(find_key_by_slug(&map, "rock-roll"), Some("Rock & Roll"));
        assert_eq!(find_key_by_slug(&map, "rock-roll-2"), Some("Rock Roll"));
    }
}
