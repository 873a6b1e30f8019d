// Service exports
pub mod classifier;
pub mod dataset;
pub mod music;

pub use classifier::{build_extractor, HttpClassifier, LexiconClassifier};
pub use dataset::{Dataset, DatasetError};
pub use music::{genres_or_none, GenreLookup, MusicError, SpotifyClient};
