use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "name": "Maria Kovacs",
        "phone": "+447700900123",
        "email": "maria@example.com",
        "is_active": true
    })
)]
pub struct Cleaner {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Maria Kovacs")]
    pub name: String,

    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "maria@example.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = true)]
    pub is_active: bool,
}
