//! Temporal proximity between two trade histories.

use crate::model::Trade;

/// Default alignment window, in minutes.
pub const DEFAULT_WINDOW_MINUTES: f64 = 10.0;

/// Score in `[0, 1]` of how closely two trade sets line up on shared instruments.
///
/// Every cross pair on the same instrument is one comparison. A comparison
/// `d` minutes apart contributes `1 - d / window` when `d <= window` and
/// nothing otherwise; the score is the mean contribution, capped at 1.
/// Empty inputs or no shared instrument yield 0.
pub fn timing_correlation(a: &[Trade], b: &[Trade], window_minutes: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut correlation = 0.0;
    let mut comparisons = 0usize;

    for ta in a {
        for tb in b.iter().filter(|tb| tb.instrument == ta.instrument) {
            comparisons += 1;
            let diff = ta.minutes_apart(tb);
            if diff <= window_minutes {
                correlation += 1.0 - diff / window_minutes;
            }
        }
    }

    if comparisons == 0 {
        return 0.0;
    }

    (correlation / comparisons as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::trade;
    use crate::model::Direction::{Buy, Sell};

    const W: f64 = DEFAULT_WINDOW_MINUTES;

    #[test]
    fn empty_side_is_zero() {
        let a = vec![trade("A", "EURUSD", Buy, 0.0)];
        assert_eq!(timing_correlation(&a, &[], W), 0.0);
        assert_eq!(timing_correlation(&[], &a, W), 0.0);
    }

    #[test]
    fn no_shared_instrument_is_zero() {
        let a = vec![trade("A", "EURUSD", Buy, 0.0)];
        let b = vec![trade("B", "GBPUSD", Sell, 0.0)];
        assert_eq!(timing_correlation(&a, &b, W), 0.0);
    }

    #[test]
    fn linear_decay_inside_window() {
        let a = vec![trade("A", "EURUSD", Buy, 0.0)];
        let b = vec![trade("B", "EURUSD", Sell, 2.0)];
        assert!((timing_correlation(&a, &b, W) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn exactly_at_window_contributes_nothing() {
        let a = vec![trade("A", "EURUSD", Buy, 0.0)];
        let b = vec![trade("B", "EURUSD", Buy, 10.0)];
        assert_eq!(timing_correlation(&a, &b, W), 0.0);
    }

    #[test]
    fn outside_window_still_counts_as_comparison() {
        let a = vec![trade("A", "EURUSD", Buy, 0.0)];
        let b = vec![
            trade("B", "EURUSD", Buy, 0.0),
            trade("B", "EURUSD", Buy, 90.0),
        ];
        // (1.0 + 0.0) / 2
        assert_eq!(timing_correlation(&a, &b, W), 0.5);
    }

    #[test]
    fn simultaneous_trades_score_one() {
        let a = vec![trade("A", "EURUSD", Buy, 0.0), trade("A", "XAUUSD", Sell, 30.0)];
        let b = vec![trade("B", "EURUSD", Sell, 0.0), trade("B", "XAUUSD", Buy, 30.0)];
        assert_eq!(timing_correlation(&a, &b, W), 1.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = vec![trade("A", "EURUSD", Buy, 5.0), trade("A", "EURUSD", Sell, 1.0)];
        let b = vec![trade("B", "EURUSD", Sell, 3.0), trade("B", "EURUSD", Buy, 40.0)];
        let mut a_rev = a.clone();
        a_rev.reverse();
        let mut b_rev = b.clone();
        b_rev.reverse();

        let forward = timing_correlation(&a, &b, W);
        let reversed = timing_correlation(&a_rev, &b_rev, W);
        assert!((forward - reversed).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&forward));
    }
}
