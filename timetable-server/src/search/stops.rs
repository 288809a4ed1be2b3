//! Free-text stop lookup.

use std::collections::HashMap;

use crate::domain::Stop;
use crate::fuzzy::matches_query;

use super::config::SearchConfig;

/// Memoized name test for one query.
///
/// Route tables repeat the same stop name once per line and direction, so
/// each distinct name is scored only once per search.
pub struct NameMatcher<'n> {
    query: String,
    threshold: f64,
    seen: HashMap<&'n str, bool>,
}

impl<'n> NameMatcher<'n> {
    /// Create a matcher for a trimmed query.
    pub fn new(query: &str, threshold: f64) -> Self {
        Self {
            query: query.trim().to_string(),
            threshold,
            seen: HashMap::new(),
        }
    }

    /// Whether the query is empty after trimming.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Whether `name` satisfies the query.
    pub fn matches(&mut self, name: &'n str) -> bool {
        if self.query.is_empty() {
            return false;
        }
        let (query, threshold) = (&self.query, self.threshold);
        *self
            .seen
            .entry(name)
            .or_insert_with(|| matches_query(name, query, threshold))
    }
}

/// Whether a query should be read as a line number.
fn is_line_query(query: &str) -> bool {
    !query.is_empty() && query.bytes().all(|b| b.is_ascii_digit())
}

/// Stops matching a free-text query.
///
/// An all-digit query selects stops whose line number starts with it;
/// anything else is matched against stop names. An empty query matches
/// nothing.
pub fn find_stops(stops: &[Stop], query: &str, config: &SearchConfig) -> Vec<Stop> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    if is_line_query(query) {
        return stops
            .iter()
            .filter(|s| s.line.to_string().starts_with(query))
            .cloned()
            .collect();
    }

    let mut matcher = NameMatcher::new(query, config.threshold);
    stops
        .iter()
        .filter(|&s| matcher.matches(&s.name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Times;

    fn stop(id: u64, line: u32, name: &str) -> Stop {
        Stop {
            id,
            line,
            direction: "Centrum".to_string(),
            name: name.to_string(),
            times: Times {
                hours: vec![8],
                ..Times::default()
            },
        }
    }

    fn ids(stops: &[Stop]) -> Vec<u64> {
        stops.iter().map(|s| s.id).collect()
    }

    fn sample() -> Vec<Stop> {
        vec![
            stop(1, 1, "Main St"),
            stop(2, 1, "Elm St"),
            stop(3, 12, "Main Street"),
            stop(4, 150, "Oak Ave"),
            stop(5, 21, "Main St"),
        ]
    }

    #[test]
    fn line_number_prefix() {
        let config = SearchConfig::default();
        assert_eq!(ids(&find_stops(&sample(), "1", &config)), vec![1, 2, 3, 4]);
        assert_eq!(ids(&find_stops(&sample(), "15", &config)), vec![4]);
        assert_eq!(ids(&find_stops(&sample(), "21", &config)), vec![5]);
        assert!(find_stops(&sample(), "9", &config).is_empty());
    }

    #[test]
    fn name_prefix_and_fuzzy() {
        let config = SearchConfig::default();
        assert_eq!(ids(&find_stops(&sample(), "main", &config)), vec![1, 3, 5]);
        assert_eq!(ids(&find_stops(&sample(), "Mian St", &config)), vec![1, 5]);
        assert_eq!(ids(&find_stops(&sample(), "oak", &config)), vec![4]);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let config = SearchConfig::default();
        assert!(find_stops(&sample(), "", &config).is_empty());
        assert!(find_stops(&sample(), "   ", &config).is_empty());
    }

    #[test]
    fn mixed_query_is_a_name() {
        let config = SearchConfig::default();
        assert!(find_stops(&sample(), "1a", &config).is_empty());
    }

    #[test]
    fn matcher_memoizes_per_name() {
        let names = ["Rynek".to_string(), "Rynek".to_string(), "Plac".to_string()];
        let mut matcher = NameMatcher::new("ryn", 0.9);
        let hits: Vec<bool> = names.iter().map(|n| matcher.matches(n)).collect();

        assert_eq!(hits, vec![true, true, false]);
        assert_eq!(matcher.seen.len(), 2);
    }

    #[test]
    fn empty_matcher_rejects_everything() {
        let mut matcher = NameMatcher::new("  ", 0.0);
        assert!(matcher.is_empty());
        assert!(!matcher.matches("Rynek"));
    }
}
