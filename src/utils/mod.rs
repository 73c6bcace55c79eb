mod maths_utils;
mod perf;
mod time_utils;

pub use time_utils::{
    AppInstant, TimeUtils, epoch_ms_to_date_string, epoch_ms_to_datetime_string,
    format_duration, now_timestamp_ms,
};

pub(crate) use maths_utils::{get_max, get_min, padded_range};
