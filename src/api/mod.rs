pub mod analytics;
pub mod area;
pub mod assist;
pub mod attendance;
pub mod cleaner;
pub mod customer;
pub mod review;
pub mod task_log;
