use anyhow::Result;
use ndarray::{Array1, Array2};

use crate::models::LinearRegression;

/// Straight-line fit of price against candle index `0..n`.
#[derive(Debug, Clone)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub fitted: Vec<f64>,
}

impl TrendFit {
    pub fn n(&self) -> usize {
        self.fitted.len()
    }

    pub fn predict_at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }

    /// Predictions for indices `n..n + steps`.
    pub fn extend(&self, steps: usize) -> Vec<f64> {
        (self.n()..self.n() + steps)
            .map(|i| self.predict_at(i))
            .collect()
    }
}

pub fn fit_linear_trend(prices: &[f64]) -> Result<TrendFit> {
    let n = prices.len();
    let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
    let y = Array1::from(prices.to_vec());

    let mut model = LinearRegression::new();
    model.fit(&x, &y)?;
    let r_squared = model.score(&x, &y)?;
    let fitted = model.predict(&x)?.to_vec();

    let slope = model.coefficients.as_ref().map(|c| c[0]).unwrap_or_default();
    let intercept = model.intercept.unwrap_or_default();

    Ok(TrendFit {
        slope,
        intercept,
        r_squared,
        fitted,
    })
}
