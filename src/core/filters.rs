use crate::models::{QueryTraveller, TravellerRecord};

/// Check if a record shares the query traveller's declared preferences
///
/// Networking travellers want to meet new people, so colleagues are excluded.
/// Everyone else is only matched with colleagues.
#[inline]
pub fn matches_preferences(record: &TravellerRecord, query: &QueryTraveller) -> bool {
    if record.free_time != query.free_time || record.mood != query.mood {
        return false;
    }

    if record.networking != query.networking {
        return false;
    }

    if query.networking {
        record.company != query.company
    } else {
        record.company == query.company
    }
}

/// Stage 2: refine a traveller set by mood, free time and networking rules
///
/// Deterministic and order-preserving.
pub fn filter_basic<'a, I>(records: I, query: &QueryTraveller) -> Vec<&'a TravellerRecord>
where
    I: IntoIterator<Item = &'a TravellerRecord>,
{
    records
        .into_iter()
        .filter(|record| matches_preferences(record, query))
        .collect()
}
