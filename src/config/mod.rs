//! Configuration module for the analysis pipelines.

// Can all be private now because we have a public re-export.
mod binance;
mod debug;
mod persistence;
mod plot;

// Public
pub mod constants;

// Re-export commonly used items
pub use binance::{BINANCE, BinanceApiConfig};
pub use debug::{DF, LOG_PERFORMANCE};
pub use plot::{PLOT_CONFIG, PlotConfig};
pub use persistence::{
    BitcoinPersistenceConfig, ExercisePersistenceConfig, PERSISTENCE, TrafficPersistenceConfig,
};
