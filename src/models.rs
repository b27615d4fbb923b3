pub mod app_state;
pub mod error;
pub mod job;
pub mod page;
