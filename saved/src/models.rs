pub mod change;
pub mod keyed;
pub mod notice;
pub mod storage_event;
pub mod tab_id;
