//! Debugging feature flags.

pub struct LogFlags {
    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,

    /// Log every page of klines pulled from Binance.
    pub log_kline_pages: bool,

    /// Log MLP loss every `training_log_every` epochs.
    pub log_training_progress: bool,
    pub training_log_every: usize,

    /// Log each synthetic row the recursive forecaster appends.
    pub log_forecast_steps: bool,

    /// Log every VDS file as it is parsed (skips are always logged).
    pub log_vds_files: bool,
}

pub const DF: LogFlags = LogFlags {
    log_performance: false,
    log_kline_pages: false,
    log_training_progress: false,
    training_log_every: 50,
    log_forecast_steps: false,
    log_vds_files: true,
};

pub const LOG_PERFORMANCE: bool = DF.log_performance;
