pub mod account;
pub mod coerce;
pub mod statistics;
pub mod user_profile;
pub mod video;
