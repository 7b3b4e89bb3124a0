use crate::auth::auth::AuthUser;
use crate::engine::error::EngineError;
use crate::engine::ledger;
use crate::model::allowance::AllowanceRecord;
use crate::model::role::Role;
use crate::model::vacation_request::VacationRequest;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use super::store_error;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    #[schema(example = 2026)]
    /// Ledger year; defaults to the current year
    pub year: Option<i32>,
    #[schema(example = 1000)]
    /// Another employee's ledger (HR/Administrator only)
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 26)]
    pub total_days: u32,
    #[schema(example = 5)]
    pub carryover_days: u32,
    #[schema(example = 5)]
    pub used_carryover: u32,
    #[schema(example = 0)]
    pub used_current_year: u32,
    #[schema(example = 5)]
    pub used_total: u32,
    #[schema(example = 0)]
    pub remaining_carryover: u32,
    #[schema(example = 26)]
    pub remaining_current_year: u32,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub carryover_expires_on: NaiveDate,
}

/// Swagger doc for get_balance endpoint
#[utoipa::path(
    get,
    path = "/api/v1/allowance/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Allowance balance for the year", body = BalanceResponse),
        (status = 400, description = "No allowance configured for the year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Allowance"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let own_employee_id = auth.employee_id;
    let employee_id = match query.employee_id {
        Some(other) if own_employee_id != Some(other) => {
            if !matches!(auth.role, Role::Hr | Role::Administrator) {
                return Err(actix_web::error::ErrorForbidden(
                    "Only HR/Administrator may view other ledgers",
                ));
            }
            other
        }
        _ => own_employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
    };

    let year = query.year.unwrap_or_else(|| Utc::now().date_naive().year());

    let record = sqlx::query_as::<_, AllowanceRecord>(
        r#"
        SELECT id, employee_id, year, total_days, carryover_days
        FROM allowances
        WHERE employee_id = ? AND year = ?
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| store_error(e, "load allowance"))?
    .ok_or(EngineError::NoAllowanceConfigured { employee_id, year })?;

    let approved = sqlx::query_as::<_, VacationRequest>(
        r#"
        SELECT id, employee_id, start_date, end_date, business_days, status,
               processed_by, processed_at, rejection_reason, created_at, updated_at
        FROM vacation_requests
        WHERE employee_id = ? AND status = 'approved' AND YEAR(start_date) = ?
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| store_error(e, "load approved requests"))?;

    let used = ledger::compute_consumption(&record, &approved);

    Ok(HttpResponse::Ok().json(BalanceResponse {
        employee_id,
        year,
        total_days: record.total_days,
        carryover_days: record.carryover_days,
        used_carryover: used.used_carryover,
        used_current_year: used.used_current_year,
        used_total: used.used_total(),
        remaining_carryover: ledger::remaining_carryover(&record, used),
        remaining_current_year: ledger::remaining_current_year(&record, used),
        carryover_expires_on: ledger::carryover_expiry(year),
    }))
}
