use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::core::overlap::parse_trip_date;
use crate::error::MatchError;
use crate::models::{TravellerRecord, SENTINEL_NAME};

/// Errors that can occur while loading the traveller dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to open dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One dataset row as written by the data preparation scripts
#[derive(Debug, Deserialize)]
struct RawTravellerRow {
    #[serde(rename = "Traveller Name")]
    name: String,
    #[serde(rename = "Trip", default)]
    trip: String,
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Arrival Date")]
    arrival_date: String,
    #[serde(rename = "Return Date")]
    return_date: String,
    #[serde(rename = "Departure City", default)]
    departure_city: String,
    #[serde(rename = "Arrival City")]
    arrival_city: String,
    company: String,
    networking: String,
    #[serde(alias = "moods")]
    mood: String,
    free_time: String,
    #[serde(default)]
    accommodation: Option<String>,
    #[serde(default)]
    tweet: Option<String>,
    #[serde(rename = "Music Genre", default)]
    music_genre: Option<String>,
    #[serde(rename = "Suggested Club/Pub", default)]
    suggested_venue: Option<String>,
}

fn parse_flag(value: &str) -> Result<bool, MatchError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(MatchError::InvalidField {
            field: "networking",
            value: value.to_string(),
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "None")
}

impl TryFrom<RawTravellerRow> for TravellerRecord {
    type Error = MatchError;

    fn try_from(row: RawTravellerRow) -> Result<Self, Self::Error> {
        if row.name.trim() == SENTINEL_NAME {
            return Err(MatchError::InvalidField {
                field: "Traveller Name",
                value: row.name,
            });
        }

        let arrival_date = parse_trip_date(&row.arrival_date)?;
        let return_date = parse_trip_date(&row.return_date)?;
        if return_date < arrival_date {
            return Err(MatchError::InvalidTripWindow {
                arrival_date,
                return_date,
            });
        }

        Ok(TravellerRecord {
            name: row.name,
            trip: row.trip,
            id: row.id,
            arrival_date,
            return_date,
            departure_city: row.departure_city,
            arrival_city: row.arrival_city,
            company: row.company,
            networking: parse_flag(&row.networking)?,
            mood: row.mood.parse()?,
            free_time: row.free_time.parse()?,
            accommodation: non_empty(row.accommodation),
            tweet: row.tweet.unwrap_or_default(),
            music_genre: non_empty(row.music_genre),
            suggested_venue: non_empty(row.suggested_venue),
        })
    }
}

/// Recorded travellers, loaded once and shared read-only
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<TravellerRecord>,
    skipped: usize,
}

impl Dataset {
    pub fn new(records: Vec<TravellerRecord>) -> Self {
        Self {
            records,
            skipped: 0,
        }
    }

    /// Load the dataset from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let dataset = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} travellers from {} ({} rows skipped)",
            dataset.len(),
            path.display(),
            dataset.skipped
        );
        Ok(dataset)
    }

    /// Parse CSV rows, skipping rows that fail validation
    ///
    /// Unreadable CSV is an error; an invalid row only costs that row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut skipped = 0;

        for (line, row) in csv.deserialize::<RawTravellerRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Skipping dataset row {}: {}", line + 2, e);
                    skipped += 1;
                    continue;
                }
            };

            let name = row.name.clone();
            match TravellerRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping traveller '{}' (row {}): {}", name, line + 2, e);
                    skipped += 1;
                }
            }
        }

        Ok(Self { records, skipped })
    }

    pub fn records(&self) -> &[TravellerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows rejected at ingestion
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Every city travellers depart from or arrive in, sorted
    pub fn cities(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| [r.departure_city.as_str(), r.arrival_city.as_str()])
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Every company travellers work for, sorted
    pub fn companies(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.company.as_str())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
