// Ordinary least squares fit of y on x, with Pearson correlation.

use serde::Serialize;

/// Fewer points than this give the degenerate fit.
pub const MIN_POINTS: usize = 3;

/// Result of a simple linear regression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    pub r_squared: f64,
    /// Number of points the fit was computed from.
    pub n: usize,
}

impl LinearFit {
    fn degenerate(n: usize) -> Self {
        LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r: 0.0,
            r_squared: 0.0,
            n,
        }
    }
}

/// Fit `y = slope * x + intercept` by least squares over the paired points.
///
/// Pairs beyond the shorter slice are ignored. With fewer than
/// [`MIN_POINTS`] points every coefficient is 0. When all x are equal the
/// slope is 0 and the intercept is the mean of y. The correlation is 0
/// whenever either variable has no spread.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> LinearFit {
    let n = xs.len().min(ys.len());
    if n < MIN_POINTS {
        return LinearFit::degenerate(n);
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let nf = n as f64;

    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = xs.iter().map(|x| x * x).sum();
    let sum_y2: f64 = ys.iter().map(|y| y * y).sum();

    let cov_term = nf * sum_xy - sum_x * sum_y;
    let x_spread = nf * sum_x2 - sum_x * sum_x;
    let y_spread = nf * sum_y2 - sum_y * sum_y;

    if x_spread == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: sum_y / nf,
            r: 0.0,
            r_squared: 0.0,
            n,
        };
    }

    let slope = cov_term / x_spread;
    let intercept = (sum_y - slope * sum_x) / nf;

    let denom = (x_spread * y_spread).sqrt();
    let r = if denom > 0.0 && denom.is_finite() {
        (cov_term / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    LinearFit {
        slope,
        intercept,
        r,
        r_squared: r * r,
        n,
    }
}
