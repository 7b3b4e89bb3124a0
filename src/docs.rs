use crate::api::allowance::{BalanceQuery, BalanceResponse};
use crate::api::vacation_request::{
    ApproveResponse, ApproveVacation, CancelResponse, CreateVacation, RejectVacation,
    VacationFilter, VacationListResponse,
};
use crate::model::allowance::AllowanceRecord;
use crate::model::vacation_request::{RequestStatus, VacationRequest};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation Management API",
        version = "1.0.0",
        description = r#"
## Vacation Management System

This API manages employee paid-time-off: request submission, approval and
rejection by HR, cancellation, and the per-year allowance ledger with
carryover.

### 🔹 Key Features
- **Vacation Requests**
  - Submit, approve, reject, and cancel requests; full history retained
- **Allowance Ledger**
  - Per-year balances with carryover consumed first until its March 31 expiry
- **Admission Control**
  - Team occupancy checks at approval time, with explicit warning acknowledgment

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication** issued by the
identity service. Approvals and rejections require **Administrator** or **HR**
roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::vacation_request::vacation_list,
        crate::api::vacation_request::get_vacation,
        crate::api::vacation_request::create_vacation,
        crate::api::vacation_request::approve_vacation,
        crate::api::vacation_request::reject_vacation,
        crate::api::vacation_request::cancel_vacation,

        crate::api::allowance::get_balance
    ),
    components(
        schemas(
            VacationRequest,
            RequestStatus,
            CreateVacation,
            ApproveVacation,
            ApproveResponse,
            RejectVacation,
            CancelResponse,
            VacationFilter,
            VacationListResponse,
            AllowanceRecord,
            BalanceQuery,
            BalanceResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Vacation", description = "Vacation request lifecycle APIs"),
        (name = "Allowance", description = "Allowance ledger APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
