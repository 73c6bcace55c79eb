// Pipelines: forecasting, exercise heuristics, traffic flow
pub mod exercise;
pub mod features;
pub mod forecaster;
pub mod route_sim;
pub mod traffic;
pub mod trend;
pub mod window;

pub use forecaster::{ForecastSettings, ForecastStep, RecursiveForecaster};
pub use trend::{TrendFit, fit_linear_trend};
