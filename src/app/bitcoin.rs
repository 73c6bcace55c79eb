use std::path::Path;

use anyhow::{Context, Result, ensure};

use crate::{
    analysis::{
        ForecastSettings, RecursiveForecaster, TrendFit,
        features::build_feature_frame,
        fit_linear_trend,
        window::{last_window, sliding_windows},
    },
    config::{PERSISTENCE, constants::bitcoin::deep},
    data::{MarketDataProvider, fetch_series},
    domain::{PairInterval, Period},
    models::{MinMaxScaler, MlpConfig, MlpRegressor, OhlcvTimeSeries, TargetScaler},
    report::bitcoin::{BasicReport, DeepReport, draw_basic_chart, draw_deep_chart},
};

pub struct BasicOutcome {
    /// The analysed tail of the download.
    pub series: OhlcvTimeSeries,
    pub trend: TrendFit,
    pub future: Vec<f64>,
}

/// Trend over the last `rows` closes, extended `steps` candles ahead.
pub fn run_basic_pipeline(
    series: &OhlcvTimeSeries,
    rows: usize,
    steps: usize,
) -> Result<BasicOutcome> {
    let series = series.tail(rows);
    ensure!(
        series.len() >= 2,
        "not enough data retrieved: {} candles",
        series.len()
    );

    let trend = fit_linear_trend(&series.close_prices)?;
    let future = trend.extend(steps);
    Ok(BasicOutcome {
        series,
        trend,
        future,
    })
}

pub async fn bitcoin_basic(
    provider: &dyn MarketDataProvider,
    pair_interval: &PairInterval,
    period: Period,
    rows: usize,
    steps: usize,
    out_dir: &Path,
) -> Result<()> {
    let series = fetch_series(provider, pair_interval, period).await?;
    let outcome = run_basic_pipeline(&series, rows, steps)?;

    let chart = out_dir.join(PERSISTENCE.bitcoin.basic_chart);
    draw_basic_chart(&chart, &outcome.series, &outcome.trend, &outcome.future)?;

    let report = BasicReport {
        interval_ms: pair_interval.interval_ms,
        r_squared: outcome.trend.r_squared,
        current_price: outcome.series.last_close().unwrap_or_default(),
        future: outcome.future,
    };
    println!("\n{}", report);
    println!("Image saved to {}", chart.display());
    Ok(())
}

pub struct DeepOutcome {
    /// Closes shown in front of the forecast.
    pub display: OhlcvTimeSeries,
    pub forecast: Vec<f64>,
    pub current_price: f64,
    pub epochs: usize,
    pub final_loss: f64,
}

/// Features, scaling, windowing, MLP fit and the recursive forecast.
pub fn run_deep_pipeline(
    series: &OhlcvTimeSeries,
    rows: usize,
    settings: ForecastSettings,
    mlp_config: MlpConfig,
    steps: usize,
) -> Result<DeepOutcome> {
    let frame = build_feature_frame(series, settings.short_ma, settings.long_ma).tail(rows);
    ensure!(
        frame.len() > settings.lookback,
        "not enough data after the MA{} warm-up: {} rows, need more than {}",
        settings.long_ma,
        frame.len(),
        settings.lookback
    );

    let feature_scaler = MinMaxScaler::fit(&frame.rows)?;
    let target_scaler = TargetScaler::fit(&frame.closes())?;
    let scaled = feature_scaler.transform(&frame.rows)?;
    let samples = sliding_windows(&scaled, settings.lookback, deep::TARGET_COLUMN)?;
    log::info!(
        "Training MLP on {} samples of {} inputs...",
        samples.x.nrows(),
        samples.x.ncols()
    );

    let mut model = MlpRegressor::new(mlp_config);
    let summary = crate::trace_time!("MLP fit", 1_000_000, { model.fit(&samples.x, &samples.y) })?;
    log::info!(
        "Training complete after {} epochs (loss {:.6})",
        summary.epochs,
        summary.final_loss
    );

    let last_volume = frame
        .last_volume()
        .context("feature frame has no rows")?;
    let mut forecaster = RecursiveForecaster::new(
        &model,
        &feature_scaler,
        &target_scaler,
        last_window(&scaled, settings.lookback)?,
        frame.close_history.clone(),
        last_volume,
        settings,
    )?;
    let forecast = forecaster.forecast(steps)?;

    let display = series.tail(deep::DISPLAY_ROWS.min(rows));
    let current_price = display.last_close().unwrap_or_default();
    Ok(DeepOutcome {
        display,
        forecast,
        current_price,
        epochs: summary.epochs,
        final_loss: summary.final_loss,
    })
}

#[allow(clippy::too_many_arguments)]
pub async fn bitcoin_deep(
    provider: &dyn MarketDataProvider,
    pair_interval: &PairInterval,
    period: Period,
    rows: usize,
    settings: ForecastSettings,
    mlp_config: MlpConfig,
    steps: usize,
    out_dir: &Path,
) -> Result<()> {
    let series = fetch_series(provider, pair_interval, period).await?;
    let outcome = run_deep_pipeline(&series, rows, settings, mlp_config, steps)?;

    let chart = out_dir.join(PERSISTENCE.bitcoin.deep_chart);
    draw_deep_chart(&chart, &outcome.display, &outcome.forecast)?;

    let report = DeepReport {
        interval_ms: pair_interval.interval_ms,
        last_open_time: outcome.display.timestamps.last().copied().unwrap_or_default(),
        current_price: outcome.current_price,
        forecast: outcome.forecast,
        epochs: outcome.epochs,
        final_loss: outcome.final_loss,
    };
    println!("\n{}", report);
    println!("{}", report.forecast_table());
    println!("Image saved to {}", chart.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candle;
    use crate::utils::TimeUtils;
    use approx::assert_relative_eq;

    fn series(closes: &[f64]) -> OhlcvTimeSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(
                    i as i64 * TimeUtils::MS_IN_H,
                    c,
                    c + 1.0,
                    c - 1.0,
                    c,
                    10.0 + (i % 3) as f64,
                    c * 10.0,
                )
            })
            .collect();
        OhlcvTimeSeries::from_candles(PairInterval::new("BTCUSDT", TimeUtils::MS_IN_H), candles)
    }

    #[test]
    fn basic_pipeline_uses_the_tail() {
        let closes: Vec<f64> = (0..300).map(|i| if i < 100 { 0.0 } else { i as f64 }).collect();
        let out = run_basic_pipeline(&series(&closes), 200, 24).unwrap();
        assert_eq!(out.series.len(), 200);
        assert_eq!(out.future.len(), 24);
        assert_relative_eq!(out.trend.slope, 1.0, epsilon = 1e-9);
        assert_relative_eq!(out.future[23], 323.0, epsilon = 1e-6);
    }

    #[test]
    fn basic_pipeline_rejects_empty_download() {
        assert!(run_basic_pipeline(&series(&[100.0]), 200, 24).is_err());
    }

    #[test]
    fn deep_pipeline_produces_every_step() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let config = MlpConfig {
            hidden_layers: vec![8],
            max_iter: 30,
            ..Default::default()
        };
        let out =
            run_deep_pipeline(&series(&closes), 200, ForecastSettings::default(), config, 24)
                .unwrap();
        assert_eq!(out.forecast.len(), 24);
        assert!(out.forecast.iter().all(|p| p.is_finite()));
        assert_eq!(out.display.len(), 120);
        assert_relative_eq!(out.current_price, closes[119]);
        assert!(out.epochs <= 30);
    }

    #[test]
    fn deep_pipeline_needs_more_than_lookback_rows() {
        // 25 closes leave 6 rows after the MA20 warm-up.
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let err = run_deep_pipeline(
            &series(&closes),
            200,
            ForecastSettings::default(),
            MlpConfig::default(),
            24,
        );
        assert!(err.is_err());
    }
}
