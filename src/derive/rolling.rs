use serde::{Deserialize, Serialize};

/// How the values of one window are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAgg {
    #[default]
    Mean,
    Sum,
    Min,
    Max,
}

impl WindowAgg {
    fn apply(self, values: &[f64]) -> f64 {
        match self {
            WindowAgg::Mean => values.iter().sum::<f64>() / values.len() as f64,
            WindowAgg::Sum => values.iter().sum(),
            WindowAgg::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            WindowAgg::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(x: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (x * factor).round() / factor
}

/// Forward, end-truncated window: position `i` combines `values[i..i + window]`,
/// clipped at the end of the slice, so the last `window - 1` positions see
/// progressively fewer values. Missing values are skipped; a window with no
/// values yields `None`.
///
/// `window` must be non-zero.
pub fn forward_window(
    values: &[Option<f64>],
    window: usize,
    agg: WindowAgg,
    precision: u32,
) -> Vec<Option<f64>> {
    debug_assert!(window > 0);
    let mut buf = Vec::with_capacity(window.min(values.len()));
    (0..values.len())
        .map(|i| {
            let end = i.saturating_add(window).min(values.len());
            buf.clear();
            buf.extend(values[i..end].iter().flatten());
            if buf.is_empty() {
                None
            } else {
                Some(round_to(agg.apply(&buf), precision))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(n: usize) -> Vec<Option<f64>> {
        (1..=n).map(|v| Some(v as f64)).collect()
    }

    #[test]
    fn window_truncates_at_the_end() {
        let out = forward_window(&seq(10), 7, WindowAgg::Mean, 2);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], Some(4.0));
        assert_eq!(out[3], Some(7.0));
        assert_eq!(out[8], Some(9.5));
        assert_eq!(out[9], Some(10.0));
    }

    #[test]
    fn rounds_to_precision() {
        let vals = vec![Some(1.0), Some(1.0), Some(2.0)];
        let out = forward_window(&vals, 3, WindowAgg::Mean, 2);
        assert_eq!(out[0], Some(1.33));
        assert_eq!(out[1], Some(1.5));
        assert_eq!(round_to(2.675_1, 0), 3.0);
    }

    #[test]
    fn skips_missing_values() {
        let vals = vec![Some(2.0), None, Some(4.0), None];
        let out = forward_window(&vals, 2, WindowAgg::Mean, 2);
        assert_eq!(out, vec![Some(2.0), Some(4.0), Some(4.0), None]);
    }

    #[test]
    fn other_aggregations() {
        let vals = vec![Some(3.0), Some(1.0), Some(2.0)];
        assert_eq!(
            forward_window(&vals, 2, WindowAgg::Sum, 2),
            vec![Some(4.0), Some(3.0), Some(2.0)]
        );
        assert_eq!(
            forward_window(&vals, 3, WindowAgg::Min, 2),
            vec![Some(1.0), Some(1.0), Some(2.0)]
        );
        assert_eq!(
            forward_window(&vals, 3, WindowAgg::Max, 2),
            vec![Some(3.0), Some(2.0), Some(2.0)]
        );
    }

    #[test]
    fn window_longer_than_input() {
        let vals = vec![Some(1.0), Some(2.0)];
        assert_eq!(
            forward_window(&vals, usize::MAX, WindowAgg::Mean, 2),
            vec![Some(1.5), Some(2.0)]
        );
        assert_eq!(forward_window(&[], usize::MAX, WindowAgg::Sum, 2), vec![]);
    }

    #[test]
    fn window_of_one_is_identity() {
        let vals = seq(4);
        assert_eq!(forward_window(&vals, 1, WindowAgg::Mean, 2), vals);
    }
}
