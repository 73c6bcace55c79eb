// Domain types and value objects
mod candle;
mod exercise;
mod pair_interval;
mod period;

pub use candle::Candle;
pub use exercise::{
    Done, ExerciseRecord, ExerciseType, Routine, Routines, parse_day_abbrev, routine_key,
    weekday_abbrev,
};
pub use pair_interval::PairInterval;
pub use period::Period;
