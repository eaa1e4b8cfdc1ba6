use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "customer_id": 1,
        "name": "3rd Floor Kitchen",
        "qr_code": "QR-0012",
        "is_active": true,
        "sort_order": 3
    })
)]
pub struct Area {
    #[schema(example = 12)]
    pub id: u64,

    #[schema(example = 1)]
    pub customer_id: u64,

    #[schema(example = "3rd Floor Kitchen")]
    pub name: String,

    /// Code printed on the QR label posted at the area, unique when present
    #[schema(example = "QR-0012", nullable = true)]
    pub qr_code: Option<String>,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(example = 3)]
    pub sort_order: i32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AreaTask {
    #[schema(example = 40)]
    pub id: u64,

    #[schema(example = 12)]
    pub area_id: u64,

    #[schema(example = "Wipe down worktops")]
    pub description: String,

    #[schema(example = "daily", nullable = true)]
    pub task_type: Option<String>,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(example = 1)]
    pub sort_order: i32,
}
