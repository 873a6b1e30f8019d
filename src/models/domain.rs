use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MatchError;

/// Reserved identity of the query traveller inside a clustering batch
pub const SENTINEL_NAME: &str = "Me";

/// Trip dates are exchanged as DD/MM/YYYY
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Statement used for the query traveller when the caller supplies none
pub const DEFAULT_STATEMENT: &str = "Really enjoyed that football match! #sports";

/// Kind of activities a traveller is in the mood for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Relaxation,
    Sightseeing,
    Adventure,
    Any,
}

impl FromStr for Mood {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relaxation" => Ok(Mood::Relaxation),
            "sightseeing" => Ok(Mood::Sightseeing),
            "adventure" => Ok(Mood::Adventure),
            "any" => Ok(Mood::Any),
            _ => Err(MatchError::InvalidField {
                field: "mood",
                value: s.to_string(),
            }),
        }
    }
}

/// Time of day a traveller is generally free
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreeTime {
    Mornings,
    Evenings,
}

impl FromStr for FreeTime {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mornings" => Ok(FreeTime::Mornings),
            "evenings" => Ok(FreeTime::Evenings),
            _ => Err(MatchError::InvalidField {
                field: "free_time",
                value: s.to_string(),
            }),
        }
    }
}

/// Subscription tier controlling which matching strategies run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    #[serde(alias = "premium_interest")]
    Interest,
    #[serde(alias = "premium_psychology")]
    Psychology,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Interest => "interest",
            Tier::Psychology => "psychology",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded traveller, validated at the dataset boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravellerRecord {
    #[serde(rename = "travellerName")]
    pub name: String,
    pub trip: String,
    pub id: String,
    #[serde(with = "trip_date")]
    pub arrival_date: NaiveDate,
    #[serde(with = "trip_date")]
    pub return_date: NaiveDate,
    pub departure_city: String,
    pub arrival_city: String,
    pub company: String,
    pub networking: bool,
    pub mood: Mood,
    pub free_time: FreeTime,
    #[serde(default)]
    pub accommodation: Option<String>,
    #[serde(default)]
    pub tweet: String,
    #[serde(default)]
    pub music_genre: Option<String>,
    #[serde(rename = "suggestedClubPub", default)]
    pub suggested_venue: Option<String>,
}

impl TravellerRecord {
    pub fn is_sentinel(&self) -> bool {
        self.name == SENTINEL_NAME
    }
}

/// Request-scoped description of the traveller being matched
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTraveller {
    pub arrival_city: String,
    pub arrival_date: NaiveDate,
    pub return_date: NaiveDate,
    pub company: String,
    pub mood: Mood,
    pub networking: bool,
    pub free_time: FreeTime,
    pub statement: String,
}

impl QueryTraveller {
    /// Build a query traveller, rejecting a return date before the arrival date
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arrival_city: impl Into<String>,
        arrival_date: NaiveDate,
        return_date: NaiveDate,
        company: impl Into<String>,
        mood: Mood,
        networking: bool,
        free_time: FreeTime,
        statement: impl Into<String>,
    ) -> Result<Self, MatchError> {
        if return_date < arrival_date {
            return Err(MatchError::InvalidTripWindow {
                arrival_date,
                return_date,
            });
        }

        Ok(Self {
            arrival_city: arrival_city.into(),
            arrival_date,
            return_date,
            company: company.into(),
            mood,
            networking,
            free_time,
            statement: statement.into(),
        })
    }

    /// The sentinel record inserted into clustering batches
    ///
    /// Fields the caller does not provide are placeholders.
    pub fn to_sentinel(&self) -> TravellerRecord {
        TravellerRecord {
            name: SENTINEL_NAME.to_string(),
            trip: "None".to_string(),
            id: "None".to_string(),
            arrival_date: self.arrival_date,
            return_date: self.return_date,
            departure_city: "None".to_string(),
            arrival_city: self.arrival_city.clone(),
            company: self.company.clone(),
            networking: self.networking,
            mood: self.mood,
            free_time: self.free_time,
            accommodation: None,
            tweet: self.statement.clone(),
            music_genre: None,
            suggested_venue: None,
        }
    }
}

/// Which text-derived feature space a vector lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Sentiment,
    Personality,
}

const SENTIMENT_LABELS: [&str; 3] = ["negative", "neutral", "positive"];
const PERSONALITY_LABELS: [&str; 5] = [
    "Openness",
    "Conscientiousness",
    "Extraversion",
    "Agreeableness",
    "Neuroticism",
];

impl FeatureKind {
    /// Class labels in the fixed output order
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            FeatureKind::Sentiment => &SENTIMENT_LABELS,
            FeatureKind::Personality => &PERSONALITY_LABELS,
        }
    }

    pub fn dimension(&self) -> usize {
        self.labels().len()
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Sentiment => f.write_str("sentiment"),
            FeatureKind::Personality => f.write_str("personality"),
        }
    }
}

/// Probability-like scores extracted from one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub kind: FeatureKind,
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Score for a class label, matched case-insensitively
    pub fn get(&self, label: &str) -> Option<f64> {
        self.kind
            .labels()
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label))
            .and_then(|i| self.values.get(i).copied())
    }
}

/// k-means parameters for one latent-similarity path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringParams {
    pub clusters: usize,
    pub n_init: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            clusters: 5,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

/// Serde adapter for DD/MM/YYYY dates
pub mod trip_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(D::Error::custom)
    }
}
