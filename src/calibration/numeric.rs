//! Numerical helpers of the flux calibration.
use crate::decontam_errors::DecontamError;

/// Piecewise-linear interpolation of the samples `(xp, fp)` at `x`.
///
/// `xp` must be increasing. Outside `[xp[0], xp[n-1]]` the end values are returned.
/// An empty table or a non-finite `x` yields `0.0`.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || !x.is_finite() {
        return 0.0;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] || n == 1 {
        return fp[n - 1];
    }

    // first sample strictly above x, in 1..n
    let hi = xp[..n].partition_point(|&v| v <= x).clamp(1, n - 1);
    let lo = hi - 1;
    let span = xp[hi] - xp[lo];
    if span == 0.0 {
        return fp[hi];
    }
    let t = (x - xp[lo]) / span;
    fp[lo] + t * (fp[hi] - fp[lo])
}

/// [`interp`] at every point of `x`.
pub fn interp_all(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| interp(v, xp, fp)).collect()
}

/// `1 / value`, or `0` where the division is not finite.
pub fn reciprocal_or_zero(value: f64) -> f64 {
    let r = 1.0 / value;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

/// Width of each wavelength bin.
///
/// `w[i] = |λ[i] − λ[i−1]|` for `i ≥ 1`, and the first bin takes the width of the
/// second one.
///
/// Return
/// ----------
/// * The widths, or [`DecontamError::InsufficientWavelengthSamples`] for fewer than
///   two wavelengths.
pub fn bin_widths(wavelengths: &[f64]) -> Result<Vec<f64>, DecontamError> {
    if wavelengths.len() < 2 {
        return Err(DecontamError::InsufficientWavelengthSamples(
            wavelengths.len(),
        ));
    }
    let mut widths = Vec::with_capacity(wavelengths.len());
    widths.push((wavelengths[1] - wavelengths[0]).abs());
    widths.extend(wavelengths.windows(2).map(|w| (w[1] - w[0]).abs()));
    Ok(widths)
}

/// Index of the sample of `values` nearest to `target`, `None` if `values` is empty.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
}

/// Centred moving average of `signal` over `width` samples.
///
/// The output has the length of the input. The window is clipped at both ends and
/// the missing samples count as zero, so the ends are pulled toward zero.
pub fn smooth_signal(signal: &[f64], width: usize) -> Result<Vec<f64>, DecontamError> {
    if width == 0 {
        return Err(DecontamError::InvalidWindowWidth(width));
    }
    let n = signal.len();
    let ahead = (width - 1) / 2;
    let behind = width - 1 - ahead;

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for (i, &v) in signal.iter().enumerate() {
        prefix.push(prefix[i] + v);
    }

    Ok((0..n)
        .map(|i| {
            let start = i.saturating_sub(behind);
            let end = (i + ahead + 1).min(n);
            (prefix[end] - prefix[start]) / width as f64
        })
        .collect())
}

#[cfg(test)]
mod numeric_test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_interp() {
        let xp = [1.0, 2.0, 4.0];
        let fp = [10.0, 20.0, 0.0];

        assert_relative_eq!(interp(1.5, &xp, &fp), 15.0);
        assert_relative_eq!(interp(3.0, &xp, &fp), 10.0);
        assert_relative_eq!(interp(2.0, &xp, &fp), 20.0);
        assert_relative_eq!(interp(0.0, &xp, &fp), 10.0);
        assert_relative_eq!(interp(9.0, &xp, &fp), 0.0);
        assert_eq!(interp(1.0, &[], &[]), 0.0);
        assert_eq!(interp_all(&[1.0, 4.0], &xp, &fp), vec![10.0, 0.0]);
    }

    #[test]
    fn test_interp_non_finite_abscissa() {
        let xp = [1.0, 2.0, 3.0];
        let fp = [5.0, 5.0, 5.0];
        assert_eq!(interp(f64::NAN, &xp, &fp), 0.0);
        assert_eq!(interp(f64::INFINITY, &xp, &fp), 0.0);
        assert_eq!(
            interp_all(&[1.0, f64::NAN, 3.0], &xp, &fp),
            vec![5.0, 0.0, 5.0]
        );
    }

    #[test]
    fn test_reciprocal_or_zero() {
        assert_eq!(reciprocal_or_zero(4.0), 0.25);
        assert_eq!(reciprocal_or_zero(0.0), 0.0);
        assert_eq!(reciprocal_or_zero(-0.0), 0.0);
        assert_eq!(reciprocal_or_zero(f64::NAN), 0.0);
    }

    #[test]
    fn test_bin_widths() {
        let widths = bin_widths(&[100.0, 110.0, 130.0, 160.0]).unwrap();
        assert_eq!(widths, vec![10.0, 10.0, 20.0, 30.0]);

        let decreasing = bin_widths(&[160.0, 130.0]).unwrap();
        assert_eq!(decreasing, vec![30.0, 30.0]);

        assert_eq!(
            bin_widths(&[1.0]).unwrap_err(),
            DecontamError::InsufficientWavelengthSamples(1)
        );
    }

    #[test]
    fn test_nearest_index() {
        let grid = [12_000.0, 12_300.0, 12_600.0];
        assert_eq!(nearest_index(&grid, 12_400.0), Some(1));
        assert_eq!(nearest_index(&grid, 20_000.0), Some(2));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn test_smooth_signal() {
        let flat = smooth_signal(&[2.0; 5], 1).unwrap();
        assert_eq!(flat, vec![2.0; 5]);

        let smoothed = smooth_signal(&[0.0, 3.0, 0.0, 3.0, 0.0], 3).unwrap();
        assert_relative_eq!(smoothed[1], 1.0);
        assert_relative_eq!(smoothed[2], 2.0);
        assert_relative_eq!(smoothed[0], 1.0);

        assert_eq!(
            smooth_signal(&[1.0], 0).unwrap_err(),
            DecontamError::InvalidWindowWidth(0)
        );
    }
}
