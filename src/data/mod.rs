mod bn_kline;
mod exercise_store;
mod provider;
mod rate_limiter;
mod vds;

pub use {
    exercise_store::{
        append_record, default_routines, load_records, load_routines, save_routines,
    },
    provider::{BinanceProvider, MarketDataProvider, fetch_series},
    rate_limiter::GlobalRateLimiter,
    vds::{
        VdsLoadReport, VdsRecord, discover_vds_files, filter_junctions, load_processed,
        load_vds_dir, parse_vds_file, save_processed,
    },
};

pub(crate) use bn_kline::load_klines;
