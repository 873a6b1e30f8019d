// Core algorithm exports
pub mod clustering;
pub mod features;
pub mod filters;
pub mod lexicon;
pub mod matcher;
pub mod overlap;
pub mod recommend;

pub use clustering::{kmeans, standardize, ClusterAssignment, KMeansFit, SimilarityClusterer};
pub use features::{softmax, FeatureExtractor, TextClassifier};
pub use filters::{filter_basic, matches_preferences};
pub use lexicon::{InterestLexicon, INTEREST_TOPICS};
pub use matcher::{MatchResult, Matcher};
pub use overlap::{filter_overlap, overlaps_query, parse_trip_date, windows_overlap};
pub use recommend::{matching_venues, rank_accommodations, recommend_hotels, HOUSE_HOTELS};
