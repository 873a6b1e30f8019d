use aho_corasick::AhoCorasick;

use crate::error::MatchError;

/// Interest topics and the literal keywords that signal them
pub const INTEREST_TOPICS: &[(&str, &[&str])] = &[
    ("gardening", &["gardening", "planting", "landscaping"]),
    (
        "cuisine",
        &["cuisine", "cooking", "culinary arts", "gastronomy"],
    ),
    (
        "museums",
        &[
            "museums",
            "exhibitions",
            "art galleries",
            "cultural centres",
        ],
    ),
    ("walking", &["walking", "strolling", "treading"]),
    (
        "parks",
        &["parks", "public gardens", "recreational areas"],
    ),
    ("hiking", &["hiking", "trekking", "trail hiking"]),
    (
        "outdoors",
        &[
            "park",
            "garden",
            "trail",
            "hiking",
            "walking",
            "strolling",
            "trekking",
            "outdoor",
            "nature",
        ],
    ),
    (
        "leisure",
        &[
            "museum", "theatre", "cinema", "concert", "gallery", "exhibit", "show", "event",
        ],
    ),
    (
        "sports",
        &[
            "sports",
            "soccer",
            "tennis",
            "basketball",
            "football",
            "baseball",
            "golf",
            "fitness",
            "gym",
        ],
    ),
    (
        "travel",
        &[
            "travel",
            "vacation",
            "trip",
            "expedition",
            "cruise",
            "tour",
            "journey",
        ],
    ),
    (
        "food",
        &[
            "cuisine",
            "cooking",
            "eating",
            "dining",
            "foodie",
            "gastronomy",
            "culinary",
        ],
    ),
];

/// Keyword gate applied before sentiment scoring
///
/// Matching is a case-insensitive substring search, so "Parkour" mentions "park".
#[derive(Debug, Clone)]
pub struct InterestLexicon {
    matcher: AhoCorasick,
}

impl InterestLexicon {
    pub fn new() -> Result<Self, MatchError> {
        let keywords = INTEREST_TOPICS
            .iter()
            .flat_map(|(_, keywords)| keywords.iter().copied());

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keywords)?;

        Ok(Self { matcher })
    }

    /// Check if a statement mentions at least one interest keyword
    pub fn mentions_interest(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}
