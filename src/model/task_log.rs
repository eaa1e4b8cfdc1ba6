use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A cleaner's submission after scanning an area QR code: which tasks were
/// selected for the visit and which were marked done. Task id lists are
/// stored serialized (JSON arrays) in a TEXT column.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TaskSelection {
    #[schema(example = 100)]
    pub id: u64,

    #[schema(example = 7)]
    pub cleaner_id: u64,

    #[schema(example = "QR-0012")]
    pub qr_code: String,

    #[schema(example = "[40,41]", value_type = String)]
    pub selected_task_ids: String,

    #[schema(example = "[40]", value_type = String)]
    pub completed_task_ids: String,

    #[schema(example = "2026-01-05T09:10:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Malformed lists are treated as empty rather than failing the whole query.
pub fn parse_id_list(raw: &str) -> Vec<u64> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TaskPhoto {
    #[schema(example = 500)]
    pub id: u64,

    #[schema(example = 7)]
    pub cleaner_id: u64,

    #[schema(example = "QR-0012")]
    pub qr_code: String,

    #[schema(example = 40)]
    pub task_id: u64,

    /// Storage object key; the public URL is derived from MEDIA_BASE_URL
    #[schema(example = "photos/2026/01/05/abc.jpg")]
    pub object_key: String,

    #[schema(example = "2026-01-05T09:15:00Z", value_type = String, format = "date-time")]
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PhotoFeedback {
    #[schema(example = 9)]
    pub id: u64,

    #[schema(example = 500)]
    pub photo_id: u64,

    #[schema(example = 2)]
    pub manager_id: u64,

    #[schema(example = "Mirror still streaky, please redo")]
    pub comment: String,

    #[schema(example = "2026-01-05T11:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::parse_id_list;

    #[test]
    fn parses_well_formed_lists() {
        assert_eq!(parse_id_list("[1,2,3]"), vec![1, 2, 3]);
        assert_eq!(parse_id_list("[]"), Vec::<u64>::new());
    }

    #[test]
    fn malformed_lists_are_empty() {
        assert_eq!(parse_id_list(""), Vec::<u64>::new());
        assert_eq!(parse_id_list("not json"), Vec::<u64>::new());
        assert_eq!(parse_id_list("{\"a\":1}"), Vec::<u64>::new());
    }
}
