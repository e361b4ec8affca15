use crate::category::CategoryType;
use crate::data::{DailyRecord, RawQuote, SourceRecord};
use crate::library::QuoteLibrary;
use crate::store::MemoryLoader;

pub(crate) const STAY_HUNGRY: &str = "Stay hungry, stay foolish.";

pub(crate) fn loader() -> MemoryLoader {
    MemoryLoader::new()
        .with_sources(
            CategoryType::Author,
            vec![
                (
                    "Steve Jobs",
                    vec![
                        (STAY_HUNGRY, "Steve Jobs"),
                        ("The only way to do great work is to love what you do.", "Steve Jobs"),
                        ("Innovation distinguishes between a leader and a follower.", "Steve Jobs"),
                    ],
                ),
                (
                    "Maya Angelou",
                    vec![
                        ("Hope and fear cannot occupy the same space.", "Maya Angelou"),
                        ("Love recognizes no barriers.", "Maya Angelou"),
                    ],
                ),
                (
                    "Rumi",
                    vec![("Let yourself be silently drawn by the strange pull of what you really love.", "Rumi")],
                ),
            ],
        )
        .with_sources(
            CategoryType::Topic,
            vec![
                (
                    "Love",
                    vec![
                        ("Love is the bridge between you and everything.", "Rumi"),
                        ("Lovers don't finally meet somewhere. They're in each other all along.", "Rumi"),
                        ("Love all, trust a few, do wrong to none.", "William Shakespeare"),
                        ("Wherever you are, and whatever you do, be in love.", "Rumi"),
                        ("The course of true love never did run smooth.", "William Shakespeare"),
                        ("Love recognizes no barriers.", "Maya Angelou"),
                        ("Your task is not to seek for love, but merely to find all the barriers within yourself.", "Rumi"),
                        ("Love looks not with the eyes, but with the mind.", "William Shakespeare"),
                        ("Love is the whole thing. We are only pieces.", "Rumi"),
                    ],
                ),
                (
                    "Hope",
                    vec![
                        ("Hope is a waking dream.", "Aristotle"),
                        ("Hope is the thing with feathers that perches in the soul.", "Emily Dickinson"),
                        ("Hope and fear cannot occupy the same space.", "Maya Angelou"),
                    ],
                ),
                (
                    "Work",
                    vec![
                        ("The only way to do great work is to love what you do.", "Steve Jobs"),
                        ("Pleasure in the job puts perfection in the work.", "Aristotle"),
                    ],
                ),
            ],
        )
        .with_sources(
            CategoryType::Movie,
            vec![
                (
                    "The Godfather",
                    vec![
                        ("I'm gonna make him an offer he can't refuse.", "Vito Corleone (The Godfather)"),
                        ("Leave the gun. Take the cannoli.", "Peter Clemenza (The Godfather)"),
                    ],
                ),
                (
                    "Ferris Bueller's Day Off",
                    vec![(
                        "Life moves pretty fast. If you don't stop and look around once in a while, you could miss it.",
                        "Ferris Bueller (Ferris Bueller's Day Off)",
                    )],
                ),
            ],
        )
        .with_sources(
            CategoryType::Book,
            vec![(
                "The Great Gatsby",
                vec![(
                    "So we beat on, boats against the current, borne back ceaselessly into the past.",
                    "F. Scott Fitzgerald",
                )],
            )],
        )
        .with_records(
            CategoryType::Proverb,
            vec![SourceRecord {
                key: "Irish Blessing".to_string(),
                quotes: vec![RawQuote {
                    text: "May the road rise up to meet you.".to_string(),
                    author: "Irish Blessing".to_string(),
                }],
                single: true,
            }],
        )
        .with_author_bio("Steve Jobs", "Co-founder of Apple and Pixar.")
        .with_topic_bio("Love", "Quotes on affection, devotion and romance.")
        .with_daily(DailyRecord {
            id: "dq_1".to_string(),
            text: "The only way to do great work is to love what you do.".to_string(),
            author: "Steve Jobs".to_string(),
            category: "Work".to_string(),
        })
        .with_daily(DailyRecord {
            id: "dq_2".to_string(),
            text: "Life is what happens when you're busy making other plans.".to_string(),
            author: "John Lennon".to_string(),
            category: "Life".to_string(),
        })
}

pub(crate) fn library() -> QuoteLibrary {
    QuoteLibrary::new(loader())
}
