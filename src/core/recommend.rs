use std::collections::HashSet;

use crate::models::{HotelRecommendation, TravellerRecord};

/// Hotels recommended when nobody matched
pub const HOUSE_HOTELS: [&str; 5] = [
    "Hilton Hotel",
    "The Hotel",
    "Ibis Hotel",
    "Elite Hotel",
    "Novotel",
];

/// Count accommodations among matched travellers, most popular first
///
/// Ties keep the order in which hotels were first seen.
pub fn rank_accommodations(matches: &[TravellerRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for hotel in matches.iter().filter_map(|m| m.accommodation.as_deref()) {
        let hotel = hotel.trim();
        if hotel.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(name, _)| name == hotel) {
            Some((_, count)) => *count += 1,
            None => counts.push((hotel.to_string(), 1)),
        }
    }

    // Stable sort keeps first-seen order for ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Hotel recommendations for the destination city
pub fn recommend_hotels(matches: &[TravellerRecord], city: &str) -> Vec<HotelRecommendation> {
    let ranked = rank_accommodations(matches);

    if ranked.is_empty() {
        return HOUSE_HOTELS
            .iter()
            .map(|name| HotelRecommendation {
                name: name.to_string(),
                city: city.to_string(),
                count: 0,
            })
            .collect();
    }

    ranked
        .into_iter()
        .map(|(name, count)| HotelRecommendation {
            name,
            city: city.to_string(),
            count,
        })
        .collect()
}

/// Suggested clubs and pubs whose description mentions one of the genres
///
/// `None` genres means the traveller's music preference is unknown.
pub fn matching_venues(matches: &[TravellerRecord], genres: Option<&[String]>) -> Vec<String> {
    let Some(genres) = genres else {
        return Vec::new();
    };

    let genres: Vec<String> = genres
        .iter()
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect();

    let mut seen = HashSet::new();
    matches
        .iter()
        .filter_map(|m| m.suggested_venue.as_deref())
        .filter(|venue| {
            let venue = venue.to_lowercase();
            genres.iter().any(|genre| venue.contains(genre.as_str()))
        })
        .filter(|venue| seen.insert(venue.to_string()))
        .map(str::to_string)
        .collect()
}
