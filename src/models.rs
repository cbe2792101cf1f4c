//! Data types shared across the acquisition and analytics paths.

/// One timestamped temperature sample.
///
/// Created once per poll cycle or per fetched row, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Temperature in degrees Celsius.
    pub tempc: f64,
}

/// Selection mode for fetching historical readings.
///
/// The three modes are mutually exclusive; when both a record count and a
/// lookback window are supplied, the count limit takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindow {
    /// The most recent N records (N > 0).
    LastN(u32),
    /// All records newer than `now - seconds` (seconds > 0).
    Lookback(u64),
    /// Every record.
    All,
}

impl QueryWindow {
    /// Build a window from the raw CLI values, applying the precedence
    /// rule: count limit over lookback, lookback over "all".
    pub fn from_flags(count: u32, lookback_secs: u64) -> Self {
        if count > 0 {
            QueryWindow::LastN(count)
        } else if lookback_secs > 0 {
            QueryWindow::Lookback(lookback_secs)
        } else {
            QueryWindow::All
        }
    }
}

/// Summary statistics over a batch of readings.
///
/// Derived purely from the batch, never persisted; recomputed on every
/// query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempStats {
    /// Number of readings in the batch.
    pub n: usize,
    /// Smallest temperature and the timestamp of its first occurrence.
    pub min: f64,
    pub min_time: i64,
    /// Largest temperature and the timestamp of its first occurrence.
    pub max: f64,
    pub max_time: i64,
    /// Lower-middle element of the sorted values (not averaged for even n).
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation (divides by n, not n - 1).
    pub std_dev: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_limit_takes_precedence_over_lookback() {
        assert_eq!(QueryWindow::from_flags(5, 3600), QueryWindow::LastN(5));
    }

    #[test]
    fn lookback_applies_when_count_is_zero() {
        assert_eq!(QueryWindow::from_flags(0, 3600), QueryWindow::Lookback(3600));
    }

    #[test]
    fn neither_flag_selects_all_records() {
        assert_eq!(QueryWindow::from_flags(0, 0), QueryWindow::All);
    }
}
