use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One entry of the static weekly schedule the on-time check matches against.
/// `weekday` is 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeeklySchedule {
    pub id: u64,
    pub cleaner_id: u64,
    pub weekday: u8,
    pub start_time: NaiveTime,
}
