//! Command runners. Each subcommand maps to one function here that wires
//! data loading, analysis and reporting together.

mod bitcoin;
mod exercise;
mod traffic;

pub use bitcoin::{
    BasicOutcome, DeepOutcome, bitcoin_basic, bitcoin_deep, run_basic_pipeline,
    run_deep_pipeline,
};
pub use exercise::{
    LogEntry, NewRoutine, exercise_log, exercise_overview, exercise_report, routine_add,
    routine_list, routine_remove, routine_set_days,
};
pub use traffic::{route_params, route_sim, traffic_analyze, traffic_load};
