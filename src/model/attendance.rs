use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 7)]
    pub cleaner_id: u64,

    #[schema(example = 1)]
    pub customer_id: u64,

    #[schema(example = "2026-01-05T08:58:00Z", value_type = String, format = "date-time")]
    pub clock_in: DateTime<Utc>,

    /// Null while the shift is still open
    #[schema(example = "2026-01-05T17:02:00Z", value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,
}
