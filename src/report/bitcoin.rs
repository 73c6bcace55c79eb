use std::{fmt, path::Path};

use anyhow::Result;
use plotters::prelude::*;
use tabled::{Table, Tabled, settings::Style};

use crate::{
    analysis::TrendFit,
    config::PLOT_CONFIG,
    models::OhlcvTimeSeries,
    report::{caption_style, label_style, prepare_output},
    utils::{TimeUtils, epoch_ms_to_datetime_string, now_timestamp_ms, padded_range},
};

/// `(diff, pct)` of `to` against `from`.
pub fn expected_change(from: f64, to: f64) -> (f64, f64) {
    let diff = to - from;
    let pct = if from != 0.0 { diff / from * 100.0 } else { 0.0 };
    (diff, pct)
}

fn change_line(from: f64, to: f64) -> String {
    let (diff, pct) = expected_change(from, to);
    format!("{:+.2} ({:+.2}%)", diff, pct)
}

#[derive(Debug, Clone)]
pub struct BasicReport {
    pub interval_ms: i64,
    pub r_squared: f64,
    pub current_price: f64,
    pub future: Vec<f64>,
}

impl fmt::Display for BasicReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let target = self.future.last().copied().unwrap_or(self.current_price);
        let horizon = self.future.len();
        writeln!(
            f,
            "[Basic Model Prediction - {}]",
            TimeUtils::interval_to_string(self.interval_ms)
        )?;
        writeln!(f, "Model Reliability (R^2): {:.4}", self.r_squared)?;
        writeln!(f, "Current Price:     ${:.2}", self.current_price)?;
        writeln!(f, "Price in {} Steps: ${:.2}", horizon, target)?;
        write!(
            f,
            "Expected Change:   {}",
            change_line(self.current_price, target)
        )
    }
}

#[derive(Debug, Clone)]
pub struct DeepReport {
    pub interval_ms: i64,
    pub last_open_time: i64,
    pub current_price: f64,
    pub forecast: Vec<f64>,
    pub epochs: usize,
    pub final_loss: f64,
}

impl DeepReport {
    /// One row per forecast step with its projected candle time.
    pub fn forecast_table(&self) -> String {
        #[derive(Tabled)]
        struct Row {
            #[tabled(rename = "Step")]
            step: usize,
            #[tabled(rename = "Open Time")]
            time: String,
            #[tabled(rename = "Predicted")]
            price: String,
            #[tabled(rename = "vs Now")]
            change: String,
        }

        let rows: Vec<Row> = self
            .forecast
            .iter()
            .enumerate()
            .map(|(i, &p)| Row {
                step: i + 1,
                time: epoch_ms_to_datetime_string(
                    self.last_open_time + (i as i64 + 1) * self.interval_ms,
                ),
                price: format!("{:.2}", p),
                change: change_line(self.current_price, p),
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    }
}

impl fmt::Display for DeepReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let next = self.forecast.first().copied().unwrap_or(self.current_price);
        let target = self.forecast.last().copied().unwrap_or(self.current_price);
        writeln!(
            f,
            "[Advanced Model Prediction - {} x {}]",
            self.forecast.len(),
            TimeUtils::interval_to_string(self.interval_ms)
        )?;
        writeln!(
            f,
            "Training:        {} epochs, loss {:.6}",
            self.epochs, self.final_loss
        )?;
        writeln!(f, "Current Price:   ${:.2}", self.current_price)?;
        writeln!(f, "Next Step Pred:  ${:.2}", next)?;
        writeln!(f, "Final Pred:      ${:.2}", target)?;
        write!(
            f,
            "Expected Change: {}",
            change_line(self.current_price, target)
        )
    }
}

/// History, fitted trend, the extension past the last candle and an R² box.
pub fn draw_basic_chart(
    path: &Path,
    series: &OhlcvTimeSeries,
    trend: &TrendFit,
    future: &[f64],
) -> Result<()> {
    prepare_output(path)?;

    let n = series.len();
    let prices = &series.close_prices;
    let t0 = series.timestamps.first().copied().unwrap_or_default();
    let interval = series.pair_interval.interval_ms;

    let all: Vec<f64> = prices
        .iter()
        .chain(trend.fitted.iter())
        .chain(future.iter())
        .copied()
        .collect();
    let (y_lo, y_hi) = padded_range(&all, PLOT_CONFIG.plot_y_padding_pct);
    let x_hi = ((n + future.len()).max(2) - 1) as f64;
    let x_fmt = |x: &f64| epoch_ms_to_datetime_string(t0 + (x * interval as f64).round() as i64);

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!(
        "Bitcoin Prediction - Basic Linear (Next {} Steps) | {}",
        future.len(),
        epoch_ms_to_datetime_string(now_timestamp_ms())
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(title, caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(0f64..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_labels(PLOT_CONFIG.time_axis_labels)
        .x_label_formatter(&x_fmt)
        .x_desc("Date & Time")
        .y_desc("Price (USD)")
        .label_style(label_style())
        .draw()?;

    let history = PLOT_CONFIG.color_history;
    let trend_color = PLOT_CONFIG.color_trend;
    let forecast = PLOT_CONFIG.color_forecast;

    chart
        .draw_series(LineSeries::new(
            prices.iter().enumerate().map(|(i, &p)| (i as f64, p)),
            history.mix(0.6).stroke_width(1),
        ))?
        .label(format!("History (Past {} Candles)", n))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], history));

    chart
        .draw_series(LineSeries::new(
            trend
                .fitted
                .iter()
                .enumerate()
                .map(|(i, &p)| (i as f64, p)),
            trend_color.mix(0.7).stroke_width(1),
        ))?
        .label("Linear Best Fit")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], trend_color));

    let future_points: Vec<(f64, f64)> = future
        .iter()
        .enumerate()
        .map(|(i, &p)| ((n + i) as f64, p))
        .collect();
    chart
        .draw_series(LineSeries::new(
            future_points.iter().copied(),
            forecast.stroke_width(2),
        ))?
        .label(format!("Future Prediction (Next {})", future.len()))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], forecast));
    if let Some(&end) = future_points.last() {
        chart.draw_series(std::iter::once(Circle::new(end, 5, forecast.filled())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(label_style())
        .draw()?;

    let box_lines = [
        format!("Model Accuracy (R^2): {:.4}", trend.r_squared),
        "(Linear Trend Reliability)".to_string(),
    ];
    let bx = PLOT_CONFIG.y_label_area as i32 + PLOT_CONFIG.margin as i32 + 20;
    let by = 60;
    let line_h = 20;
    root.draw(&Rectangle::new(
        [(bx - 8, by - 6), (bx + 260, by + line_h * box_lines.len() as i32)],
        PLOT_CONFIG.color_text_box.mix(0.5).filled(),
    ))?;
    for (i, line) in box_lines.iter().enumerate() {
        root.draw(&Text::new(
            line.clone(),
            (bx, by + line_h * i as i32),
            label_style(),
        ))?;
    }

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

/// Recent history with the recursive forecast path appended after the last close.
pub fn draw_deep_chart(path: &Path, history: &OhlcvTimeSeries, forecast: &[f64]) -> Result<()> {
    prepare_output(path)?;

    let n = history.len();
    let prices = &history.close_prices;
    let t0 = history.timestamps.first().copied().unwrap_or_default();
    let interval = history.pair_interval.interval_ms;

    let all: Vec<f64> = prices.iter().chain(forecast.iter()).copied().collect();
    let (y_lo, y_hi) = padded_range(&all, PLOT_CONFIG.plot_y_padding_pct);
    let x_hi = ((n + forecast.len()).max(2) - 1) as f64;
    let x_fmt = |x: &f64| epoch_ms_to_datetime_string(t0 + (x * interval as f64).round() as i64);

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!(
        "Bitcoin Prediction - Deep Learning (Recursive {} Steps) | {}",
        forecast.len(),
        epoch_ms_to_datetime_string(now_timestamp_ms())
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(title, caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(0f64..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_labels(PLOT_CONFIG.time_axis_labels)
        .x_label_formatter(&x_fmt)
        .x_desc("Date & Time")
        .y_desc("Price (USD)")
        .label_style(label_style())
        .draw()?;

    let history_color = PLOT_CONFIG.color_history;
    let forecast_color = PLOT_CONFIG.color_trend;

    chart
        .draw_series(LineSeries::new(
            prices.iter().enumerate().map(|(i, &p)| (i as f64, p)),
            history_color.stroke_width(1),
        ))?
        .label(format!("History (Last {} Candles)", n))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], history_color));

    // Join the path to the last real close so the forecast reads as a continuation.
    let mut path_points: Vec<(f64, f64)> = prices
        .last()
        .map(|&p| vec![((n - 1) as f64, p)])
        .unwrap_or_default();
    path_points.extend(
        forecast
            .iter()
            .enumerate()
            .map(|(i, &p)| ((n + i) as f64, p)),
    );
    chart
        .draw_series(LineSeries::new(
            path_points.iter().copied(),
            forecast_color.stroke_width(2),
        ))?
        .label(format!("AI Prediction (Next {})", forecast.len()))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], forecast_color));
    if let Some(&end) = path_points.last() {
        chart.draw_series(std::iter::once(Circle::new(end, 6, forecast_color.filled())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(label_style())
        .draw()?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fit_linear_trend;
    use crate::domain::{Candle, PairInterval};
    use approx::assert_relative_eq;

    fn hourly(closes: &[f64]) -> OhlcvTimeSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(
                    1_704_067_200_000 + i as i64 * TimeUtils::MS_IN_H,
                    c,
                    c,
                    c,
                    c,
                    5.0,
                    c * 5.0,
                )
            })
            .collect();
        OhlcvTimeSeries::from_candles(PairInterval::new("BTCUSDT", TimeUtils::MS_IN_H), candles)
    }

    #[test]
    fn bitcoin_charts_render() {
        let dir = tempfile::tempdir().unwrap();
        let closes: Vec<f64> = (0..48)
            .map(|i| 42_000.0 + i as f64 * 15.0 + (i as f64 * 0.7).sin() * 40.0)
            .collect();
        let series = hourly(&closes);

        let trend = fit_linear_trend(&series.close_prices).unwrap();
        let basic = dir.path().join("out/bitcoin_basic_result.png");
        draw_basic_chart(&basic, &series, &trend, &trend.extend(24)).unwrap();

        let deep = dir.path().join("out/bitcoin_deep_result.png");
        let forecast: Vec<f64> = (1..=24).map(|i| closes[47] + i as f64 * 3.0).collect();
        draw_deep_chart(&deep, &series, &forecast).unwrap();

        assert!(std::fs::metadata(&basic).unwrap().len() > 0);
        assert!(std::fs::metadata(&deep).unwrap().len() > 0);
    }

    #[test]
    fn expected_change_signs() {
        let (diff, pct) = expected_change(200.0, 210.0);
        assert_relative_eq!(diff, 10.0);
        assert_relative_eq!(pct, 5.0);
        assert_eq!(change_line(200.0, 190.0), "-10.00 (-5.00%)");
        assert_eq!(expected_change(0.0, 5.0).1, 0.0);
    }

    #[test]
    fn basic_report_text() {
        let report = BasicReport {
            interval_ms: TimeUtils::MS_IN_H,
            r_squared: 0.81234,
            current_price: 100.0,
            future: vec![101.0, 102.0],
        };
        let text = report.to_string();
        assert!(text.contains("Model Reliability (R^2): 0.8123"));
        assert!(text.contains("Current Price:     $100.00"));
        assert!(text.contains("Price in 2 Steps: $102.00"));
        assert!(text.contains("Expected Change:   +2.00 (+2.00%)"));
    }

    #[test]
    fn deep_table_has_one_row_per_step() {
        let report = DeepReport {
            interval_ms: TimeUtils::MS_IN_H,
            last_open_time: 0,
            current_price: 100.0,
            forecast: vec![99.0, 98.5, 101.0],
            epochs: 12,
            final_loss: 0.01,
        };
        let table = report.forecast_table();
        assert!(table.contains("1970-01-01 01:00"));
        assert!(table.contains("1970-01-01 03:00"));
        assert!(table.contains("+1.00 (+1.00%)"));
        assert!(report.to_string().contains("Final Pred:      $101.00"));
    }
}
