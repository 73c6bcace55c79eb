mod linear;
mod mlp;
mod ohlcv;
mod regressor;
mod scaler;

pub use {
    linear::LinearRegression,
    mlp::{MlpConfig, MlpRegressor, TrainingSummary},
    ohlcv::OhlcvTimeSeries,
    regressor::Regressor,
    scaler::{MinMaxScaler, TargetScaler},
};
