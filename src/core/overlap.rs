use chrono::NaiveDate;

use crate::error::MatchError;
use crate::models::{QueryTraveller, TravellerRecord, DATE_FORMAT};

/// Parse a DD/MM/YYYY trip date
pub fn parse_trip_date(value: &str) -> Result<NaiveDate, MatchError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| MatchError::DateParse(value.to_string()))
}

/// Closed-interval overlap of two trip windows
///
/// Trips touching on a single day overlap.
#[inline]
pub fn windows_overlap(
    arrival: NaiveDate,
    return_date: NaiveDate,
    other_arrival: NaiveDate,
    other_return: NaiveDate,
) -> bool {
    arrival <= other_return && return_date >= other_arrival
}

/// Check if a record is in the query's destination city during the query's trip
#[inline]
pub fn overlaps_query(record: &TravellerRecord, query: &QueryTraveller) -> bool {
    record.arrival_city == query.arrival_city
        && windows_overlap(
            record.arrival_date,
            record.return_date,
            query.arrival_date,
            query.return_date,
        )
}

/// Stage 1: travellers in the same city at the same time as the query traveller
///
/// Input order is preserved.
pub fn filter_overlap<'a, I>(records: I, query: &QueryTraveller) -> Vec<&'a TravellerRecord>
where
    I: IntoIterator<Item = &'a TravellerRecord>,
{
    records
        .into_iter()
        .filter(|record| overlaps_query(record, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FreeTime, Mood};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn traveller(name: &str, city: &str, arrival: u32, return_day: u32) -> TravellerRecord {
        TravellerRecord {
            name: name.to_string(),
            trip: "T".to_string(),
            id: name.to_string(),
            arrival_date: date(arrival),
            return_date: date(return_day),
            departure_city: "London".to_string(),
            arrival_city: city.to_string(),
            company: "Acme".to_string(),
            networking: true,
            mood: Mood::Any,
            free_time: FreeTime::Evenings,
            accommodation: None,
            tweet: String::new(),
            music_genre: None,
            suggested_venue: None,
        }
    }

    fn query(city: &str, arrival: u32, return_day: u32) -> QueryTraveller {
        QueryTraveller::new(
            city,
            date(arrival),
            date(return_day),
            "Acme",
            Mood::Any,
            true,
            FreeTime::Evenings,
            "",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_trip_date() {
        assert_eq!(parse_trip_date("05/06/2024").unwrap(), date(5));
        assert!(matches!(
            parse_trip_date("2024-06-05"),
            Err(MatchError::DateParse(_))
        ));
        assert!(parse_trip_date("").is_err());
        assert!(parse_trip_date("31/02/2024").is_err());
    }

    #[test]
    fn test_overlap_selects_only_intersecting_trip() {
        let records = vec![
            traveller("X", "Paris", 10, 15),
            traveller("Y", "Paris", 20, 25),
        ];

        let result = filter_overlap(&records, &query("Paris", 12, 18));
        let names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["X"]);
    }

    #[test]
    fn test_overlap_boundary_day_counts() {
        let records = vec![traveller("A", "Paris", 5, 12)];
        assert_eq!(filter_overlap(&records, &query("Paris", 12, 18)).len(), 1);

        let records = vec![traveller("B", "Paris", 18, 22)];
        assert_eq!(filter_overlap(&records, &query("Paris", 12, 18)).len(), 1);

        let records = vec![traveller("C", "Paris", 19, 22)];
        assert!(filter_overlap(&records, &query("Paris", 12, 18)).is_empty());
    }

    #[test]
    fn test_overlap_requires_same_city() {
        let records = vec![
            traveller("A", "Berlin", 12, 18),
            traveller("B", "paris", 12, 18),
        ];
        assert!(filter_overlap(&records, &query("Paris", 12, 18)).is_empty());
    }

    #[test]
    fn test_overlap_is_symmetric() {
        for (a, b, c, d) in [(1, 5, 5, 9), (1, 5, 6, 9), (3, 3, 3, 3), (1, 9, 4, 5)] {
            assert_eq!(
                windows_overlap(date(a), date(b), date(c), date(d)),
                windows_overlap(date(c), date(d), date(a), date(b))
            );
        }
    }
}
