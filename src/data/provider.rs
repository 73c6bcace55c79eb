use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::config::BINANCE;
use crate::data::{GlobalRateLimiter, load_klines};
use crate::domain::{Candle, PairInterval, Period};
use crate::models::OhlcvTimeSeries;
use crate::utils::{epoch_ms_to_date_string, format_duration, now_timestamp_ms};

/// Abstract interface for fetching market data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch candles for a pair opening at or after `start_time` (epoch ms).
    async fn fetch_candles(
        &self,
        pair: &str,
        interval_ms: i64,
        start_time: i64,
    ) -> Result<Vec<Candle>>;
}

pub struct BinanceProvider {
    limiter: GlobalRateLimiter,
}

impl BinanceProvider {
    pub fn new(limiter: GlobalRateLimiter) -> Self {
        Self { limiter }
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new(GlobalRateLimiter::new(BINANCE.limits.weight_limit_minute))
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    async fn fetch_candles(
        &self,
        pair: &str,
        interval_ms: i64,
        start_time: i64,
    ) -> Result<Vec<Candle>> {
        let pair_interval = PairInterval::new(pair, interval_ms);
        let klines = load_klines(&pair_interval, start_time, self.limiter.clone()).await?;
        Ok(klines.into_iter().map(Candle::from).collect())
    }
}

/// Fetch `period` worth of candles ending now and pack them into a series.
pub async fn fetch_series(
    provider: &dyn MarketDataProvider,
    pair_interval: &PairInterval,
    period: Period,
) -> Result<OhlcvTimeSeries> {
    let start = period.start_ms(now_timestamp_ms());
    log::info!("Downloading {} over the last {}...", pair_interval, period);

    let candles = provider
        .fetch_candles(&pair_interval.name, pair_interval.interval_ms, start)
        .await
        .with_context(|| format!("download failed for {}", pair_interval))?;

    if candles.is_empty() {
        bail!("no candles returned for {}", pair_interval);
    }
    if let (Some(first), Some(last)) = (candles.first(), candles.last()) {
        log::info!(
            "Downloaded {} candles for {} spanning {} ({} to {})",
            candles.len(),
            pair_interval,
            format_duration(last.timestamp_ms - first.timestamp_ms),
            epoch_ms_to_date_string(first.timestamp_ms),
            epoch_ms_to_date_string(last.timestamp_ms)
        );
    }

    Ok(OhlcvTimeSeries::from_candles(pair_interval.clone(), candles))
}
