//! Fixed list of city names recognized without any surrounding cue.

/// Known cities, in canonical spelling.
pub const KNOWN_CITIES: &[&str] = &[
    "New York",
    "Los Angeles",
    "San Francisco",
    "San Diego",
    "San Jose",
    "Chicago",
    "Seattle",
    "Portland",
    "Austin",
    "Dallas",
    "Houston",
    "Boston",
    "Denver",
    "Miami",
    "Atlanta",
    "Philadelphia",
    "Phoenix",
    "Nashville",
    "Las Vegas",
    "Washington",
    "London",
    "Paris",
    "Berlin",
    "Madrid",
    "Rome",
    "Amsterdam",
    "Dublin",
    "Tokyo",
    "Singapore",
    "Toronto",
    "Vancouver",
    "Sydney",
];

/// Canonical spelling of `candidate` if it names a known city. Case-insensitive.
pub fn lookup_city(candidate: &str) -> Option<&'static str> {
    let candidate = candidate.trim();
    KNOWN_CITIES
        .iter()
        .copied()
        .find(|city| city.eq_ignore_ascii_case(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_city() {
        assert_eq!(lookup_city("austin"), Some("Austin"));
        assert_eq!(lookup_city(" NEW YORK "), Some("New York"));
        assert_eq!(lookup_city("Springfield"), None);
        assert_eq!(lookup_city(""), None);
    }
}
