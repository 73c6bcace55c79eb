use statrs::statistics::Statistics;

use crate::config::constants::bitcoin::deep;
use crate::models::OhlcvTimeSeries;

pub const N_FEATURES: usize = deep::FEATURE_NAMES.len();

/// Trailing mean over `window` values; `None` until the window is full.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(values[i + 1 - window..=i].iter().mean())
            }
        })
        .collect()
}

/// Mean of the last `window` values, or `None` if there are fewer.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(values[values.len() - window..].iter().mean())
}

/// `[close, volume, ma_short, ma_long]` rows with warm-up rows dropped.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub timestamps: Vec<i64>,
    pub rows: Vec<Vec<f64>>,
    /// Every close up to and including the last row, warm-up rows included,
    /// so moving averages can be extended past the end of the frame.
    pub close_history: Vec<f64>,
}

impl FeatureFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the last `n` rows. The close history is left intact.
    pub fn tail(mut self, n: usize) -> Self {
        let start = self.rows.len().saturating_sub(n);
        self.rows.drain(..start);
        self.timestamps.drain(..start);
        self
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r[deep::TARGET_COLUMN]).collect()
    }

    pub fn last_volume(&self) -> Option<f64> {
        self.rows.last().map(|r| r[1])
    }
}

pub fn build_feature_frame(
    series: &OhlcvTimeSeries,
    short_window: usize,
    long_window: usize,
) -> FeatureFrame {
    let closes = &series.close_prices;
    let ma_short = rolling_mean(closes, short_window);
    let ma_long = rolling_mean(closes, long_window);

    let mut timestamps = Vec::with_capacity(closes.len());
    let mut rows = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if let (Some(s), Some(l)) = (ma_short[i], ma_long[i]) {
            timestamps.push(series.timestamps[i]);
            rows.push(vec![closes[i], series.base_asset_volumes[i], s, l]);
        }
    }

    FeatureFrame {
        timestamps,
        rows,
        close_history: closes.clone(),
    }
}
