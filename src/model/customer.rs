use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Riverside Business Park",
        "is_deleted": false
    })
)]
pub struct Customer {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Riverside Business Park")]
    pub name: String,

    /// Soft-delete flag; deleted customers are hidden, never removed
    #[schema(example = false)]
    pub is_deleted: bool,
}
