use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory read model. Account and team CRUD live in the directory
/// service; this service only reads rows and team membership.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "employee_code": "EMP-1000",
        "first_name": "John",
        "last_name": "Doe",
        "team_id": 10,
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1000)]
    pub id: u64,

    #[schema(example = "EMP-1000")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = 10)]
    pub team_id: u64,

    #[schema(example = "active")]
    pub status: String,
}
