//! Simple Moving Average with partial leading windows.
//!
//! O(n) sliding window over a running sum.
//! SMA(n)[i] = (V[max(0, i-n+1)] + ... + V[i]) / min(n, i+1)
//! No warmup: the first (n-1) values average the shorter history that exists.

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }

    let mut sma = Vec::with_capacity(values.len());
    let mut window_sum: f64 = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i < period {
            window_sum += value;
        } else {
            window_sum += value - values[i - period];
        }

        let window_len = (i + 1).min(period);
        sma.push(window_sum / window_len as f64);
    }

    sma
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_partial_warmup() {
        let series = calculate_sma(&[10.0, 20.0, 30.0], 15);

        assert_eq!(series.len(), 3);
        assert!((series[0] - 10.0).abs() < f64::EPSILON);
        assert!((series[1] - 15.0).abs() < f64::EPSILON);
        assert!((series[2] - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_period_1() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(calculate_sma(&values, 1), values.to_vec());
    }

    #[test]
    fn sma_basic_calculation() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);

        assert!((series[2] - 2.0).abs() < f64::EPSILON);
        assert!((series[4] - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_sliding_window() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let series = calculate_sma(&values, 5);

        // mean(1..=4)
        assert!((series[3] - 2.5).abs() < f64::EPSILON);
        // mean(16..=20)
        assert!((series[19] - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_equal_prices() {
        let values = vec![12.5; 20];
        for period in [5, 15] {
            assert!(calculate_sma(&values, period).iter().all(|&v| v == 12.5));
        }
    }

    #[test]
    fn sma_matches_window_mean() {
        let values = [10.25, 11.5, 9.75, 12.0, 13.25, 12.5, 14.0, 15.75];
        let series = calculate_sma(&values, 3);

        for (i, &v) in series.iter().enumerate() {
            let start = (i + 1).saturating_sub(3);
            let window = &values[start..=i];
            let expected = window.iter().sum::<f64>() / window.len() as f64;
            assert!((v - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn sma_empty_values() {
        assert!(calculate_sma(&[], 3).is_empty());
    }

    #[test]
    fn sma_period_0() {
        assert!(calculate_sma(&[10.0, 20.0], 0).is_empty());
    }
}
