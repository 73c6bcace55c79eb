use argminmax::ArgMinMax;

#[inline]
pub(crate) fn get_max(vec: &[f64]) -> f64 {
    if vec.is_empty() {
        return f64::NAN;
    }
    let max_index: usize = vec.argmax();
    vec[max_index]
}

#[inline]
pub(crate) fn get_min(vec: &[f64]) -> f64 {
    if vec.is_empty() {
        return f64::NAN;
    }
    let min_index: usize = vec.argmin();
    vec[min_index]
}

/// Min/max of the series widened by `pad` (fraction of the span) for chart axes.
/// A flat series still gets a non-empty range.
pub(crate) fn padded_range(values: &[f64], pad: f64) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 1.0);
    }
    let lo = get_min(&finite);
    let hi = get_max(&finite);
    let span = hi - lo;
    if span <= f64::EPSILON {
        let bump = lo.abs().max(1.0) * 0.05;
        return (lo - bump, hi + bump);
    }
    (lo - span * pad, hi + span * pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn min_max_pick_extremes() {
        let v = [3.0, -1.5, 9.25, 0.0];
        assert_eq!(get_max(&v), 9.25);
        assert_eq!(get_min(&v), -1.5);
        assert!(get_max(&[]).is_nan());
    }

    #[test]
    fn padded_range_handles_flat_series() {
        let (lo, hi) = padded_range(&[10.0, 10.0], 0.1);
        assert!(lo < 10.0 && hi > 10.0);
        let (lo, hi) = padded_range(&[0.0, 10.0], 0.1);
        assert_relative_eq!(lo, -1.0);
        assert_relative_eq!(hi, 11.0);
    }
}
