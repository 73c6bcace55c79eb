use anyhow::{Result, ensure};
use ndarray::{Array1, Array2};

/// Flattened training samples built from a sliding window.
#[derive(Debug, Clone)]
pub struct WindowedSamples {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

/// Row-major concatenation of a window's rows.
pub fn flatten(window: &[Vec<f64>]) -> Vec<f64> {
    window.iter().flatten().copied().collect()
}

/// Sample i is `rows[i..i + lookback]` flattened, labelled with
/// `rows[i + lookback][target_col]`.
pub fn sliding_windows(
    rows: &[Vec<f64>],
    lookback: usize,
    target_col: usize,
) -> Result<WindowedSamples> {
    ensure!(lookback > 0, "lookback must be positive");
    ensure!(
        rows.len() > lookback,
        "need more than {} rows to build a window, got {}",
        lookback,
        rows.len()
    );
    let width = rows[0].len();
    ensure!(target_col < width, "target column {} out of range", target_col);
    ensure!(
        rows.iter().all(|r| r.len() == width),
        "ragged rows: every row must have {} columns",
        width
    );

    let n_samples = rows.len() - lookback;
    let mut flat = Vec::with_capacity(n_samples * lookback * width);
    let mut targets = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        flat.extend(flatten(&rows[i..i + lookback]));
        targets.push(rows[i + lookback][target_col]);
    }

    Ok(WindowedSamples {
        x: Array2::from_shape_vec((n_samples, lookback * width), flat)?,
        y: Array1::from(targets),
    })
}

/// The most recent `lookback` rows, oldest first.
pub fn last_window(rows: &[Vec<f64>], lookback: usize) -> Result<Vec<Vec<f64>>> {
    ensure!(
        lookback > 0 && rows.len() >= lookback,
        "need at least {} rows for the last window, got {}",
        lookback,
        rows.len()
    );
    Ok(rows[rows.len() - lookback..].to_vec())
}
