use {
    crate::domain::{Candle, PairInterval},
    serde::{Deserialize, Serialize},
};

/// Column-oriented candle storage.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OhlcvTimeSeries {
    pub pair_interval: PairInterval,
    pub timestamps: Vec<i64>,
    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
    pub close_prices: Vec<f64>,
    pub base_asset_volumes: Vec<f64>,
    pub quote_asset_volumes: Vec<f64>,
}

impl OhlcvTimeSeries {
    pub fn from_candles(pair_interval: PairInterval, candles: Vec<Candle>) -> Self {
        let len = candles.len();

        let mut ts_vec = Vec::with_capacity(len);
        let mut open_vec = Vec::with_capacity(len);
        let mut high_vec = Vec::with_capacity(len);
        let mut low_vec = Vec::with_capacity(len);
        let mut close_vec = Vec::with_capacity(len);
        let mut base_vec = Vec::with_capacity(len);
        let mut quote_vec = Vec::with_capacity(len);

        for c in candles {
            ts_vec.push(c.timestamp_ms);
            open_vec.push(c.open_price);
            high_vec.push(c.high_price);
            low_vec.push(c.low_price);
            close_vec.push(c.close_price);
            base_vec.push(c.base_asset_volume);
            quote_vec.push(c.quote_asset_volume);
        }

        Self {
            pair_interval,
            timestamps: ts_vec,
            open_prices: open_vec,
            high_prices: high_vec,
            low_prices: low_vec,
            close_prices: close_vec,
            base_asset_volumes: base_vec,
            quote_asset_volumes: quote_vec,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The most recent `n` candles (or all of them when shorter).
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self {
            pair_interval: self.pair_interval.clone(),
            timestamps: self.timestamps[start..].to_vec(),
            open_prices: self.open_prices[start..].to_vec(),
            high_prices: self.high_prices[start..].to_vec(),
            low_prices: self.low_prices[start..].to_vec(),
            close_prices: self.close_prices[start..].to_vec(),
            base_asset_volumes: self.base_asset_volumes[start..].to_vec(),
            quote_asset_volumes: self.quote_asset_volumes[start..].to_vec(),
        }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close_prices.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: i64) -> OhlcvTimeSeries {
        let candles = (0..n)
            .map(|i| Candle::new(i * 1000, 1.0, 2.0, 0.5, i as f64, 10.0 + i as f64, 0.0))
            .collect();
        OhlcvTimeSeries::from_candles(PairInterval::new("BTCUSDT", 1000), candles)
    }

    #[test]
    fn columns_follow_candle_order() {
        let s = series(4);
        assert_eq!(s.len(), 4);
        assert_eq!(s.timestamps, vec![0, 1000, 2000, 3000]);
        assert_eq!(s.base_asset_volumes, vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(s.last_close(), Some(3.0));
    }

    #[test]
    fn tail_keeps_latest_rows() {
        let s = series(10).tail(3);
        assert_eq!(s.close_prices, vec![7.0, 8.0, 9.0]);
        assert_eq!(series(2).tail(5).len(), 2);
        assert!(series(0).is_empty());
    }
}
