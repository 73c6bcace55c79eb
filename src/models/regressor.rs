use anyhow::Result;

/// A fitted single-output model that maps one flattened feature vector to one value.
pub trait Regressor {
    fn predict_one(&self, x: &[f64]) -> Result<f64>;
}
