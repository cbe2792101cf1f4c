//! Summary statistics over a batch of readings.

use crate::errors::TemperError;
use crate::models::{Reading, TempStats};

/// Compute summary statistics over `readings`.
///
/// One pass accumulates the sum and tracks the extremes (the first
/// occurrence of an extreme keeps its timestamp; a later equal value does
/// not overwrite it), a second pass accumulates squared deviations for the
/// population variance, and the median is the lower-middle element of the
/// sorted values.
///
/// An empty batch is rejected with [`TemperError::EmptyDataset`] rather
/// than dividing by zero.
pub fn calc_temp_stats(readings: &[Reading]) -> Result<TempStats, TemperError> {
    let first = readings.first().ok_or(TemperError::EmptyDataset)?;
    let n = readings.len();

    let mut sum = 0.0;
    let mut min = first.tempc;
    let mut min_time = first.timestamp;
    let mut max = first.tempc;
    let mut max_time = first.timestamp;

    for reading in readings {
        sum += reading.tempc;
        if reading.tempc > max {
            max = reading.tempc;
            max_time = reading.timestamp;
        }
        if reading.tempc < min {
            min = reading.tempc;
            min_time = reading.timestamp;
        }
    }

    let mean = sum / n as f64;

    let mut squared_deviations = 0.0;
    let mut sorted = Vec::with_capacity(n);
    for reading in readings {
        squared_deviations += (reading.tempc - mean) * (reading.tempc - mean);
        sorted.push(reading.tempc);
    }
    let std_dev = (squared_deviations / n as f64).sqrt();

    sorted.sort_by(f64::total_cmp);
    let median = sorted[n / 2];

    Ok(TempStats {
        n,
        min,
        min_time,
        max,
        max_time,
        median,
        mean,
        std_dev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(points: &[(i64, f64)]) -> Vec<Reading> {
        points
            .iter()
            .map(|&(timestamp, tempc)| Reading { timestamp, tempc })
            .collect()
    }

    /// Worked example: min/max carry timestamps, the median follows the
    /// lower-middle rule and the standard deviation is the population one.
    #[test]
    fn summary_of_known_batch() {
        let readings = batch(&[(1, 5.0), (2, 9.0), (3, 3.0), (4, 7.0)]);
        let stats = calc_temp_stats(&readings).expect("non-empty batch");

        assert_eq!(stats.n, 4);
        assert_eq!(stats.min, 3.0);
        assert_eq!(stats.min_time, 3);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.max_time, 2);
        assert_eq!(stats.mean, 6.0);
        // sorted = [3, 5, 7, 9], index 4 / 2 = 2
        assert_eq!(stats.median, 7.0);
        assert!((stats.std_dev - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    /// The first occurrence of an extreme keeps its timestamp.
    #[test]
    fn ties_keep_the_earliest_timestamp() {
        let readings = batch(&[(10, 5.0), (20, 5.0), (30, 5.0)]);
        let stats = calc_temp_stats(&readings).expect("non-empty batch");
        assert_eq!(stats.min_time, 10);
        assert_eq!(stats.max_time, 10);
    }

    #[test]
    fn single_reading_is_its_own_summary() {
        let readings = batch(&[(42, 21.5)]);
        let stats = calc_temp_stats(&readings).expect("non-empty batch");
        assert_eq!(stats.n, 1);
        assert_eq!(stats.min, 21.5);
        assert_eq!(stats.max, 21.5);
        assert_eq!(stats.median, 21.5);
        assert_eq!(stats.mean, 21.5);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn odd_batch_takes_the_true_middle() {
        let readings = batch(&[(1, 1.0), (2, 3.0), (3, 2.0)]);
        let stats = calc_temp_stats(&readings).expect("non-empty batch");
        assert_eq!(stats.median, 2.0);
    }

    /// Computing twice over the same immutable batch yields identical
    /// results.
    #[test]
    fn statistics_are_idempotent() {
        let readings = batch(&[(1, 5.0), (2, 9.0), (3, 3.0), (4, 7.0)]);
        let once = calc_temp_stats(&readings).expect("non-empty batch");
        let twice = calc_temp_stats(&readings).expect("non-empty batch");
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            calc_temp_stats(&[]),
            Err(TemperError::EmptyDataset)
        ));
    }
}
