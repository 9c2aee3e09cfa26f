pub mod _structs;
pub mod classify;
pub mod maintenance;
pub mod resolve;
pub mod served_stations;

pub use _structs::{LocationType, Mode, Schedule, Snapshot, Station, Stop, TrackAssignments};
pub use classify::{classify, filter_by_day, filter_by_type, is_valid, operates_on, serves_station};
pub use maintenance::{reset_all, reset_expired};
pub use resolve::{destination_or_origin, effective_time, format_operating_days, status, TrainStatus};
pub use served_stations::normalize_served_stations;
