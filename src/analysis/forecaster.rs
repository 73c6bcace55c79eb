//! Recursive multi-step forecasting.
//!
//! A single-step regressor is rolled forward: every prediction is decoded to a
//! price, folded back into the price history, turned into a synthetic feature
//! row (last known volume, recomputed moving averages), re-scaled with the
//! fitted feature scaler and pushed onto the window in place of the oldest row.

use std::collections::VecDeque;

use anyhow::{Result, anyhow, ensure};

use crate::analysis::features::{N_FEATURES, trailing_mean};
use crate::config::{DF, constants::bitcoin::deep};
use crate::models::{MinMaxScaler, Regressor, TargetScaler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastSettings {
    pub lookback: usize,
    pub short_ma: usize,
    pub long_ma: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            lookback: deep::LOOKBACK,
            short_ma: deep::SHORT_MA,
            long_ma: deep::LONG_MA,
        }
    }
}

/// One synthetic step: the decoded price plus the row that entered the window.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    /// 1-based position past the last real row.
    pub index: usize,
    pub price: f64,
    pub raw_row: Vec<f64>,
    pub scaled_row: Vec<f64>,
}

pub struct RecursiveForecaster<'a, R: Regressor + ?Sized> {
    regressor: &'a R,
    feature_scaler: &'a MinMaxScaler,
    target_scaler: &'a TargetScaler,
    window: VecDeque<Vec<f64>>,
    price_history: Vec<f64>,
    last_volume: f64,
    settings: ForecastSettings,
    steps_taken: usize,
}

impl<'a, R: Regressor + ?Sized> RecursiveForecaster<'a, R> {
    /// `window` holds already-scaled rows, oldest first. `price_history` holds real
    /// closes ending at the window's last row.
    pub fn new(
        regressor: &'a R,
        feature_scaler: &'a MinMaxScaler,
        target_scaler: &'a TargetScaler,
        window: Vec<Vec<f64>>,
        price_history: Vec<f64>,
        last_volume: f64,
        settings: ForecastSettings,
    ) -> Result<Self> {
        ensure!(settings.lookback > 0, "lookback must be positive");
        ensure!(
            settings.short_ma > 0 && settings.short_ma <= settings.long_ma,
            "moving average windows must satisfy 0 < short ({}) <= long ({})",
            settings.short_ma,
            settings.long_ma
        );
        ensure!(
            window.len() == settings.lookback,
            "window has {} rows, expected lookback of {}",
            window.len(),
            settings.lookback
        );
        ensure!(
            window.iter().all(|r| r.len() == N_FEATURES),
            "every window row must have {} features",
            N_FEATURES
        );
        ensure!(
            feature_scaler.n_features() == N_FEATURES,
            "feature scaler was fitted on {} columns, expected {}",
            feature_scaler.n_features(),
            N_FEATURES
        );
        ensure!(
            price_history.len() >= settings.long_ma,
            "price history has {} values, need at least {} for MA{}",
            price_history.len(),
            settings.long_ma,
            settings.long_ma
        );

        Ok(Self {
            regressor,
            feature_scaler,
            target_scaler,
            window: window.into(),
            price_history,
            last_volume,
            settings,
            steps_taken: 0,
        })
    }

    pub fn window(&self) -> &VecDeque<Vec<f64>> {
        &self.window
    }

    pub fn price_history(&self) -> &[f64] {
        &self.price_history
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn step(&mut self) -> Result<ForecastStep> {
        let input: Vec<f64> = self.window.iter().flatten().copied().collect();
        let scaled_pred = self.regressor.predict_one(&input)?;
        let price = self.target_scaler.inverse(scaled_pred);

        self.price_history.push(price);
        let ma_short = trailing_mean(&self.price_history, self.settings.short_ma)
            .ok_or_else(|| anyhow!("price history too short for MA{}", self.settings.short_ma))?;
        let ma_long = trailing_mean(&self.price_history, self.settings.long_ma)
            .ok_or_else(|| anyhow!("price history too short for MA{}", self.settings.long_ma))?;

        let raw_row = vec![price, self.last_volume, ma_short, ma_long];
        let scaled_row = self.feature_scaler.transform_row(&raw_row)?;

        self.window.pop_front();
        self.window.push_back(scaled_row.clone());
        self.steps_taken += 1;

        if DF.log_forecast_steps {
            log::info!(
                "forecast step {}: price {:.2}, MA{} {:.2}, MA{} {:.2}",
                self.steps_taken,
                price,
                self.settings.short_ma,
                ma_short,
                self.settings.long_ma,
                ma_long
            );
        }

        Ok(ForecastStep {
            index: self.steps_taken,
            price,
            raw_row,
            scaled_row,
        })
    }

    /// Unbounded stream of steps; callers decide how many to take.
    pub fn steps(&mut self) -> impl Iterator<Item = Result<ForecastStep>> + '_ {
        std::iter::from_fn(move || Some(self.step()))
    }

    pub fn forecast(&mut self, n: usize) -> Result<Vec<f64>> {
        self.steps().take(n).map(|s| s.map(|s| s.price)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Predicts the scaled close of the newest window row plus a fixed drift.
    struct DriftStub(f64);

    impl Regressor for DriftStub {
        fn predict_one(&self, x: &[f64]) -> Result<f64> {
            Ok(x[x.len() - N_FEATURES] + self.0)
        }
    }

    fn fixture() -> (MinMaxScaler, TargetScaler, Vec<Vec<f64>>, Vec<f64>) {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let raw: Vec<Vec<f64>> = (19..30)
            .map(|i| {
                let hist = &closes[..=i];
                vec![
                    closes[i],
                    50.0 + i as f64,
                    trailing_mean(hist, 5).unwrap(),
                    trailing_mean(hist, 20).unwrap(),
                ]
            })
            .collect();
        let scaler = MinMaxScaler::fit(&raw).unwrap();
        let target = TargetScaler::fit(&raw.iter().map(|r| r[0]).collect::<Vec<_>>()).unwrap();
        let scaled = scaler.transform(&raw).unwrap();
        let window = scaled[scaled.len() - 10..].to_vec();
        (scaler, target, window, closes)
    }

    #[test]
    fn produces_exactly_n_prices() {
        let (scaler, target, window, closes) = fixture();
        let stub = DriftStub(0.1);
        let mut f = RecursiveForecaster::new(
            &stub,
            &scaler,
            &target,
            window,
            closes,
            79.0,
            ForecastSettings::default(),
        )
        .unwrap();
        let prices = f.forecast(24).unwrap();
        assert_eq!(prices.len(), 24);
        assert_eq!(f.price_history().len(), 30 + 24);
        assert_eq!(f.window().len(), 10);
        // Closes 119..=129 scale by 10, so each step adds 0.1 * 10.
        assert_relative_eq!(prices[0], 130.0, epsilon = 1e-9);
        assert_relative_eq!(prices[1], 131.0, epsilon = 1e-9);
    }

    #[test]
    fn window_slides_one_row_per_step() {
        let (scaler, target, window, closes) = fixture();
        let stub = DriftStub(0.0);
        let mut f = RecursiveForecaster::new(
            &stub,
            &scaler,
            &target,
            window.clone(),
            closes,
            79.0,
            ForecastSettings::default(),
        )
        .unwrap();

        let step = f.step().unwrap();
        let now: Vec<Vec<f64>> = f.window().iter().cloned().collect();
        assert_eq!(&now[..9], &window[1..]);
        assert_eq!(now[9], step.scaled_row);
        // Volume never changes across synthetic rows.
        for s in f.steps().take(5) {
            assert_eq!(s.unwrap().raw_row[1], 79.0);
        }
    }

    #[test]
    fn steps_are_numbered_from_one_independent_of_history_length() {
        let (scaler, target, window, closes) = fixture();
        let stub = DriftStub(0.0);
        let mut f = RecursiveForecaster::new(
            &stub,
            &scaler,
            &target,
            window,
            closes,
            79.0,
            ForecastSettings::default(),
        )
        .unwrap();
        assert_eq!(f.steps_taken(), 0);

        let indices: Vec<usize> = f.steps().take(4).map(|s| s.unwrap().index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(f.steps_taken(), 4);
        assert_eq!(f.price_history().len(), 30 + 4);
    }

    #[test]
    fn recomputed_averages_match_full_history() {
        let (scaler, target, window, closes) = fixture();
        let stub = DriftStub(0.05);
        let mut f = RecursiveForecaster::new(
            &stub,
            &scaler,
            &target,
            window,
            closes,
            79.0,
            ForecastSettings::default(),
        )
        .unwrap();
        for _ in 0..3 {
            let s = f.step().unwrap();
            let hist = f.price_history();
            assert_relative_eq!(s.raw_row[2], trailing_mean(hist, 5).unwrap());
            assert_relative_eq!(s.raw_row[3], trailing_mean(hist, 20).unwrap());
        }
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let (scaler, target, window, closes) = fixture();
        let stub = DriftStub(0.0);
        let settings = ForecastSettings::default();

        let short_window = window[..5].to_vec();
        let res = RecursiveForecaster::new(
            &stub,
            &scaler,
            &target,
            short_window,
            closes.clone(),
            1.0,
            settings,
        );
        assert!(res.is_err());

        let short_history = closes[..10].to_vec();
        let res =
            RecursiveForecaster::new(&stub, &scaler, &target, window, short_history, 1.0, settings);
        assert!(res.is_err());
    }
}
