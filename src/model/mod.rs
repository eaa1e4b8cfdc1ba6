pub mod area;
pub mod assist;
pub mod attendance;
pub mod cleaner;
pub mod customer;
pub mod role;
pub mod schedule;
pub mod task_log;
