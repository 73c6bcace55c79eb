//! Ordinary least squares with intercept.

use anyhow::{Result, bail, ensure};
use ndarray::{Array1, Array2, Axis};

use crate::models::Regressor;

/// Pivot magnitude below which the normal equations are treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on centred data: solves (Xc'Xc) b = Xc'yc, then intercept = mean(y) - mean(x)·b.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        ensure!(
            x.nrows() == y.len(),
            "dimension mismatch: {} rows vs {} targets",
            x.nrows(),
            y.len()
        );
        ensure!(x.nrows() >= 2, "need at least 2 samples, got {}", x.nrows());
        ensure!(x.ncols() >= 1, "need at least 1 feature");

        let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(0)), y.mean()) else {
            bail!("cannot centre empty data");
        };
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let xtx = xc.t().dot(&xc);
        let xty = xc.t().dot(&yc);
        let beta = solve_gaussian(xtx, xty)?;

        self.intercept = Some(y_mean - x_mean.dot(&beta));
        self.coefficients = Some(beta);
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (Some(coef), Some(intercept)) = (&self.coefficients, self.intercept) else {
            bail!("model has not been fitted yet");
        };
        ensure!(
            x.ncols() == coef.len(),
            "expected {} features, got {}",
            coef.len(),
            x.ncols()
        );
        Ok(x.dot(coef) + intercept)
    }

    /// Coefficient of determination of the fitted model on (x, y).
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(r_squared(&y.to_vec(), &predictions.to_vec()))
    }
}

impl Regressor for LinearRegression {
    fn predict_one(&self, x: &[f64]) -> Result<f64> {
        let (Some(coef), Some(intercept)) = (&self.coefficients, self.intercept) else {
            bail!("model has not been fitted yet");
        };
        ensure!(
            x.len() == coef.len(),
            "expected {} features, got {}",
            coef.len(),
            x.len()
        );
        Ok(coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>() + intercept)
    }
}

/// R² = 1 - SS_res / SS_tot. A constant target scores 1 when matched exactly, else 0.
pub(crate) fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual[..n]
        .iter()
        .zip(&predicted[..n])
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Gaussian elimination with partial pivoting on a square system.
fn solve_gaussian(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < SINGULAR_EPS * scale {
            bail!("design matrix is singular (column {} has no pivot)", col);
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[[i, j]] * x[j]).sum();
        x[i] = (b[i] - tail) / a[[i, i]];
    }
    Ok(x)
}
