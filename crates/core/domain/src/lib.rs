pub mod data;
pub mod station;

pub use data::{DateTree, RawMessage, StatKind, StatRecord, StatWrite, YearEntry};
pub use station::{assign_channel_ids, Station, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_TIMEZONE};
