pub mod db_utils;
pub mod grouping;
pub mod metrics;
pub mod qr_filter;
pub mod snapshot_cache;
