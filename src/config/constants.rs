// Top Level Constants

pub mod bitcoin {
    /// Binance spot pair standing in for the BTC-USD ticker.
    pub const PAIR: &str = "BTCUSDT";

    /// Both pipelines analyse only the most recent 200 candles.
    pub const ANALYSIS_ROWS: usize = 200;

    pub mod basic {
        use crate::utils::TimeUtils;

        pub const INTERVAL_MS: i64 = TimeUtils::MS_IN_H;
        pub const PERIOD: &str = "3mo";
        pub const FUTURE_STEPS: usize = 24;
    }

    pub mod deep {
        pub const LOOKBACK: usize = 10;
        pub const SHORT_MA: usize = 5;
        pub const LONG_MA: usize = 20;
        pub const DISPLAY_ROWS: usize = 200;

        /// Index of the close price inside a feature row.
        pub const TARGET_COLUMN: usize = 0;
        pub const FEATURE_NAMES: [&str; 4] = ["Close", "Volume", "MA5", "MA20"];
    }

    pub mod mlp {
        pub const HIDDEN_LAYERS: &[usize] = &[64, 32, 16];
        pub const MAX_ITER: usize = 500;
        pub const RANDOM_STATE: u64 = 42;
        pub const LEARNING_RATE: f64 = 1e-3;
        pub const L2_ALPHA: f64 = 1e-4;
        pub const MAX_BATCH_SIZE: usize = 200;
        pub const TOL: f64 = 1e-4;
        pub const N_ITER_NO_CHANGE: usize = 10;
        pub const BETA1: f64 = 0.9;
        pub const BETA2: f64 = 0.999;
        pub const EPSILON: f64 = 1e-8;
    }
}

pub mod exercise {
    pub mod recovery {
        pub const RPE_WINDOW: usize = 14;
        pub const RPE_MIN_SAMPLES: usize = 3;
        pub const HIGH_RPE: f64 = 8.0;
        pub const STREAK_DAYS: usize = 3;
        pub const FAILURE_WINDOW: usize = 5;
        pub const FAILURE_THRESHOLD: usize = 3;
    }

    pub mod recommend {
        /// Upper body work below this share of lower body work triggers advice (and vice versa).
        pub const BALANCE_RATIO: f64 = 0.6;
        pub const VARIETY_FLOOR: usize = 3;
        pub const VARIETY_MEAN_FACTOR: f64 = 2.0;
        pub const RECENT_RPE_WINDOW: usize = 5;
    }

    pub mod schedule {
        pub const LOW_ADHERENCE: f64 = 0.5;
    }

    /// Defaults for routines added from the command line.
    pub mod routine {
        pub const DEFAULT_REPS: u32 = 15;
        pub const DEFAULT_UNIT: &str = "reps";
        pub const DEFAULT_INTENSITY: u8 = 2;
        pub const MAX_INTENSITY: u8 = 5;
    }
}

pub mod traffic {
    /// Junctions kept by the loader.
    pub const TARGET_NODES: &[&str] = &["안현JC", "일직JC", "조남JC", "도리JC"];

    /// Upper bound on density for the Greenshields fit (veh/km).
    pub const DENSITY_MAX: f64 = 200.0;

    /// Weekday labels as they appear in the VDS exports, Monday first.
    pub const WEEK_ORDER: [&str; 7] = [
        "월요일", "화요일", "수요일", "목요일", "금요일", "토요일", "일요일",
    ];

    pub mod columns {
        pub const BASE_TIME: &str = "기준시간";
        pub const BASE_DATE: &str = "기준일";
        pub const WEEKDAY: &str = "요일명";
        pub const NODE: &str = "노드명";
        pub const VOLUME: &str = "교통량";
        pub const SPEED: &str = "평균속도";
    }
}

pub mod route_sim {
    pub const DEFAULT_FREE_FLOW_SPEED: f64 = 103.7;
    pub const DEFAULT_CAPACITY: f64 = 1301.0;
    pub const BPR_ALPHA: f64 = 0.15;
    pub const BPR_BETA: f64 = 4.0;
    pub const EQUILIBRIUM_TOLERANCE_MIN: f64 = 1.0;

    pub const DEFAULT_DEMAND: f64 = 2000.0;
    pub const DEFAULT_SPLIT_A_PCT: f64 = 50.0;
}
