use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours a cached ticker set stays fresh. The upstream lists are rebuilt
/// nightly, so one refresh per day is enough.
pub const CACHE_TTL_HOURS: i64 = 24;

/// An immutable set of valid uppercase ticker symbols, tagged with the time
/// it was fetched from the authoritative source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSet {
    symbols: HashSet<String>,
    fetched_at: DateTime<Utc>,
}

impl TickerSet {
    /// Build a set from raw symbols, normalizing each to uppercase and
    /// dropping empty entries.
    #[must_use]
    pub fn new<I, S>(symbols: I, fetched_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            symbols,
            fetched_at,
        }
    }

    /// Membership check, case-insensitive.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(&symbol.trim().to_uppercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// True once the set is older than [`CACHE_TTL_HOURS`].
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at >= Duration::hours(CACHE_TTL_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_from(symbols: &[&str]) -> TickerSet {
        TickerSet::new(symbols.iter().copied(), Utc::now())
    }

    #[test]
    fn contains_is_case_insensitive() {
        let set = set_from(&["AAPL", "TSLA"]);
        assert!(set.contains("AAPL"));
        assert!(set.contains("aapl"));
        assert!(set.contains(" tsla "));
        assert!(!set.contains("GME"));
    }

    #[test]
    fn new_normalizes_to_uppercase_and_drops_blanks() {
        let set = TickerSet::new(["nvda", "  ", "Amd"], Utc::now());
        assert_eq!(set.len(), 2);
        assert!(set.contains("NVDA"));
        assert!(set.contains("AMD"));
    }

    #[test]
    fn fresh_set_is_not_stale() {
        let now = Utc::now();
        let set = TickerSet::new(["AAPL"], now);
        assert!(!set.is_stale(now + Duration::hours(CACHE_TTL_HOURS - 1)));
    }

    #[test]
    fn set_older_than_ttl_is_stale() {
        let now = Utc::now();
        let set = TickerSet::new(["AAPL"], now);
        assert!(set.is_stale(now + Duration::hours(CACHE_TTL_HOURS)));
    }

    #[test]
    fn round_trips_through_json() {
        let set = set_from(&["AAPL", "MSFT"]);
        let json = serde_json::to_string(&set).unwrap();
        let back: TickerSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.contains("MSFT"));
    }
}
