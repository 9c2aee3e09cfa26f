pub mod serde_helpers;
pub mod time;

pub use time::{add_delay, next_weekday, to_minutes_since_midnight, ClockTime, WEEKDAYS};
