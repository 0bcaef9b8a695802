//! Band statistics over unmasked cells.

use mapdrop_common::{BandStats, PERCENTILE_STEPS};

/// Whether a cell holds data: not NaN and not equal to the band's nodata.
#[inline]
pub fn is_valid(value: f64, nodata: Option<f64>) -> bool {
    !value.is_nan() && nodata.map_or(true, |nd| value != nd)
}

/// Min, max, mean and the 0..=100 step 5 percentiles of the valid cells.
///
/// Returns `None` when every cell is masked.
pub fn band_stats(values: &[f64], nodata: Option<f64>) -> Option<BandStats> {
    let mut data: Vec<f64> = values
        .iter()
        .copied()
        .filter(|&v| is_valid(v, nodata))
        .collect();
    if data.is_empty() {
        return None;
    }

    data.sort_unstable_by(|a, b| a.total_cmp(b));

    let sum: f64 = data.iter().sum();
    let avg = sum / data.len() as f64;

    let percentiles = (0..PERCENTILE_STEPS)
        .map(|i| percentile_sorted(&data, i as f64 * 5.0))
        .collect();

    Some(BandStats {
        min: data[0],
        max: data[data.len() - 1],
        avg,
        percentiles,
    })
}

/// Percentile `q` (0..=100) of sorted data, linearly interpolating between
/// the closest ranks.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = (q / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi.min(last)] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_ignore_nodata_and_nan() {
        let stats = band_stats(&[1.0, -9999.0, 3.0, f64::NAN, 5.0], Some(-9999.0)).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.avg, 3.0);
        assert_eq!(stats.percentiles.len(), PERCENTILE_STEPS);
        assert_eq!(stats.percentiles[0], 1.0);
        assert_eq!(stats.percentiles[10], 3.0);
        assert_eq!(stats.percentiles[20], 5.0);
    }

    #[test]
    fn test_percentiles_interpolate() {
        // 0..=10: the 5% step lands halfway between 0 and 1
        let values: Vec<f64> = (0..=10).map(|v| v as f64).collect();
        let stats = band_stats(&values, None).unwrap();
        assert!((stats.percentiles[1] - 0.5).abs() < 1e-12);
        assert!((stats.percentiles[5] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_fully_masked_band_has_no_stats() {
        assert_eq!(band_stats(&[0.0, 0.0], Some(0.0)), None);
        assert_eq!(band_stats(&[], None), None);
    }

    #[test]
    fn test_single_value() {
        let stats = band_stats(&[42.0], None).unwrap();
        assert!(stats.percentiles.iter().all(|&p| p == 42.0));
    }
}
