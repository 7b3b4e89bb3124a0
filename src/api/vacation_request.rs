use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::error::EngineError;
use crate::engine::{lifecycle, occupancy};
use crate::model::allowance::AllowanceRecord;
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::model::vacation_request::{RequestStatus, VacationRequest};
use crate::utils::holiday_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use super::store_error;

const SELECT_REQUEST: &str = r#"
    SELECT id, employee_id, start_date, end_date, business_days, status,
           processed_by, processed_at, rejection_reason, created_at, updated_at
    FROM vacation_requests
"#;

#[derive(Deserialize, ToSchema)]
pub struct CreateVacation {
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct ApproveVacation {
    /// Must be set to proceed when the team occupancy threshold is exceeded.
    #[serde(default)]
    #[schema(example = false)]
    pub acknowledge_threshold_warning: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ApproveResponse {
    pub request: VacationRequest,
    /// Peak single-day fraction of the team absent over the request range.
    #[schema(example = 0.25)]
    pub occupancy: f64,
    #[schema(example = false)]
    pub threshold_exceeded: bool,
    /// Team members absent on the peak day, the requester included.
    #[schema(example = json!([1000]))]
    pub affected_members: Vec<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectVacation {
    #[schema(example = "team is short-staffed that week")]
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    #[schema(example = "cancelled")]
    pub status: RequestStatus,
    /// Days handed back to the ledger. Informational: cancelled requests
    /// simply stop counting toward consumption.
    #[schema(example = 5)]
    pub days_returned: u32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct VacationFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID (HR/Administrator only)
    pub employee_id: Option<u64>,
    #[schema(example = "submitted")]
    /// Filter by request status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct VacationListResponse {
    pub data: Vec<VacationRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/* =========================
Create vacation request
========================= */
/// Swagger doc for create_vacation endpoint
#[utoipa::path(
    post,
    path = "/api/v1/vacation",
    request_body(
        content = CreateVacation,
        description = "Vacation request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Vacation request submitted", body = VacationRequest),
        (status = 400, description = "Invalid range, past start date, or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Overlaps an existing request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn create_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateVacation>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let start = payload.start_date;
    let end = payload.end_date;

    // Holiday sets are reference data; load them through the cache before
    // opening the transaction.
    let from_year = start.year().min(end.year());
    let to_year = start.year().max(end.year());
    let holidays = holiday_cache::holidays_for_range(pool.get_ref(), from_year, to_year)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Holiday calendar unavailable");
            EngineError::Transient("holiday calendar".to_string())
        })?;

    let mut tx = pool.begin().await.map_err(|e| store_error(e, "begin"))?;

    // Locking the allowance row serializes concurrent balance-check-then-
    // insert sequences for the same employee.
    let record = sqlx::query_as::<_, AllowanceRecord>(
        r#"
        SELECT id, employee_id, year, total_days, carryover_days
        FROM allowances
        WHERE employee_id = ? AND year = ?
        FOR UPDATE
        "#,
    )
    .bind(employee_id)
    .bind(start.year())
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load allowance"))?;

    let existing = sqlx::query_as::<_, VacationRequest>(&format!(
        "{} WHERE employee_id = ? AND status IN ('submitted', 'approved')",
        SELECT_REQUEST
    ))
    .bind(employee_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load active requests"))?;

    let today = Utc::now().date_naive();
    let business_days = lifecycle::validate_create(
        auth.role,
        employee_id,
        today,
        start,
        end,
        &holidays,
        record.as_ref(),
        &existing,
    )?;

    let result = sqlx::query(
        r#"
        INSERT INTO vacation_requests
            (employee_id, start_date, end_date, business_days, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .bind(business_days)
    .bind(RequestStatus::Submitted)
    .execute(&mut *tx)
    .await
    .map_err(|e| store_error(e, "insert request"))?;

    let request = fetch_request(&mut tx, result.last_insert_id()).await?;
    tx.commit().await.map_err(|e| store_error(e, "commit"))?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve vacation (HR/Admin)
========================= */
/// Swagger doc for approve_vacation endpoint
#[utoipa::path(
    put,
    path = "/api/v1/vacation/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the vacation request to approve")
    ),
    request_body = ApproveVacation,
    responses(
        (status = 200, description = "Vacation request approved", body = ApproveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden or self-approval"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already processed, or occupancy threshold exceeded without acknowledgment")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn approve_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<ApproveVacation>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| store_error(e, "begin"))?;

    let request = sqlx::query_as::<_, VacationRequest>(&format!(
        "{} WHERE id = ? FOR UPDATE",
        SELECT_REQUEST
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load request"))?
    .ok_or(EngineError::NotFound(request_id))?;

    lifecycle::validate_approve(&request, auth.employee_id, auth.role)?;

    let team_id: u64 = sqlx::query_scalar("SELECT team_id FROM employees WHERE id = ?")
        .bind(request.employee_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error(e, "load team"))?
        .ok_or_else(|| EngineError::Transient("directory: request owner unknown".to_string()))?;

    // Locking the team's directory rows serializes approvals per team, so
    // the occupancy snapshot below cannot race a concurrent approval.
    let members: Vec<Employee> = sqlx::query_as(
        r#"
        SELECT id, employee_code, first_name, last_name, team_id, status
        FROM employees
        WHERE team_id = ? AND status = 'active'
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(team_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load team members"))?;
    let member_ids: Vec<u64> = members.iter().map(|m| m.id).collect();

    let team_requests = sqlx::query_as::<_, VacationRequest>(
        r#"
        SELECT vr.id, vr.employee_id, vr.start_date, vr.end_date, vr.business_days, vr.status,
               vr.processed_by, vr.processed_at, vr.rejection_reason, vr.created_at, vr.updated_at
        FROM vacation_requests vr
        JOIN employees e ON e.id = vr.employee_id
        WHERE e.team_id = ? AND vr.status = 'approved'
          AND vr.start_date <= ? AND vr.end_date >= ?
        "#,
    )
    .bind(team_id)
    .bind(request.end_date)
    .bind(request.start_date)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load team absences"))?;

    let check = occupancy::check_threshold(
        &member_ids,
        &team_requests,
        request.employee_id,
        request.start_date,
        request.end_date,
        config.occupancy_threshold,
    );
    lifecycle::enforce_admission(
        &check,
        payload.acknowledge_threshold_warning,
        config.occupancy_threshold,
    )?;

    let result = sqlx::query(
        r#"
        UPDATE vacation_requests
        SET status = 'approved', processed_by = ?, processed_at = NOW(), updated_at = NOW()
        WHERE id = ? AND status = 'submitted'
        "#,
    )
    .bind(auth.user_id)
    .bind(request_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| store_error(e, "approve request"))?;

    if result.rows_affected() == 0 {
        return Err(EngineError::InvalidStateTransition {
            from: request.status,
            action: "approve",
        }
        .into());
    }

    let updated = fetch_request(&mut tx, request_id).await?;
    tx.commit().await.map_err(|e| store_error(e, "commit"))?;

    Ok(HttpResponse::Ok().json(ApproveResponse {
        request: updated,
        occupancy: check.occupancy,
        threshold_exceeded: check.exceeds,
        affected_members: check.affected_members,
    }))
}

/* =========================
Reject vacation (HR/Admin)
========================= */
/// Swagger doc for reject_vacation endpoint
#[utoipa::path(
    put,
    path = "/api/v1/vacation/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "ID of the vacation request to reject")
    ),
    request_body = RejectVacation,
    responses(
        (status = 200, description = "Vacation request rejected", body = VacationRequest),
        (status = 400, description = "Missing rejection reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden or self-rejection"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn reject_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectVacation>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| store_error(e, "begin"))?;

    let request = sqlx::query_as::<_, VacationRequest>(&format!(
        "{} WHERE id = ? FOR UPDATE",
        SELECT_REQUEST
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load request"))?
    .ok_or(EngineError::NotFound(request_id))?;

    lifecycle::validate_reject(&request, auth.employee_id, auth.role, &payload.reason)?;

    let result = sqlx::query(
        r#"
        UPDATE vacation_requests
        SET status = 'rejected', processed_by = ?, processed_at = NOW(),
            rejection_reason = ?, updated_at = NOW()
        WHERE id = ? AND status = 'submitted'
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.reason.trim())
    .bind(request_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| store_error(e, "reject request"))?;

    if result.rows_affected() == 0 {
        return Err(EngineError::InvalidStateTransition {
            from: request.status,
            action: "reject",
        }
        .into());
    }

    let updated = fetch_request(&mut tx, request_id).await?;
    tx.commit().await.map_err(|e| store_error(e, "commit"))?;

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Cancel vacation (owner)
========================= */
/// Swagger doc for cancel_vacation endpoint
#[utoipa::path(
    put,
    path = "/api/v1/vacation/{request_id}/cancel",
    params(
        ("request_id" = u64, Path, description = "ID of the vacation request to cancel")
    ),
    responses(
        (status = 200, description = "Vacation request cancelled", body = CancelResponse),
        (status = 400, description = "Vacation already started"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the request owner"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already in a terminal status")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn cancel_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| store_error(e, "begin"))?;

    let request = sqlx::query_as::<_, VacationRequest>(&format!(
        "{} WHERE id = ? FOR UPDATE",
        SELECT_REQUEST
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| store_error(e, "load request"))?
    .ok_or(EngineError::NotFound(request_id))?;

    let today = Utc::now().date_naive();
    let days_returned = lifecycle::validate_cancel(&request, auth.employee_id, auth.role, today)?;

    let result = sqlx::query(
        r#"
        UPDATE vacation_requests
        SET status = 'cancelled', updated_at = NOW()
        WHERE id = ? AND status IN ('submitted', 'approved')
        "#,
    )
    .bind(request_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| store_error(e, "cancel request"))?;

    if result.rows_affected() == 0 {
        return Err(EngineError::InvalidStateTransition {
            from: request.status,
            action: "cancel",
        }
        .into());
    }

    tx.commit().await.map_err(|e| store_error(e, "commit"))?;

    Ok(HttpResponse::Ok().json(CancelResponse {
        status: RequestStatus::Cancelled,
        days_returned,
    }))
}

/// for getting a vacation request details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/vacation/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the vacation request to fetch")
    ),
    responses(
        (status = 200, description = "Vacation request found", body = VacationRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Vacation request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn get_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = sqlx::query_as::<_, VacationRequest>(&format!(
        "{} WHERE id = ?",
        SELECT_REQUEST
    ))
    .bind(request_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| store_error(e, "load request"))?
    .ok_or(EngineError::NotFound(request_id))?;

    if !auth.can_view(request.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your request"));
    }

    Ok(HttpResponse::Ok().json(request))
}

/// for getting vacation requests endpoint
#[utoipa::path(
    get,
    path = "/api/v1/vacation",
    params(VacationFilter),
    responses(
        (status = 200, description = "Paginated vacation request list", body = VacationListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn vacation_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<VacationFilter>,
) -> actix_web::Result<impl Responder> {
    // Employees only ever see their own history; HR and administrators may
    // filter freely.
    let employee_filter = if matches!(auth.role, Role::Hr | Role::Administrator) {
        query.employee_id
    } else {
        Some(
            auth.employee_id
                .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
        )
    };

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM vacation_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| store_error(e, "count requests"))?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{} {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        SELECT_REQUEST, where_sql
    );

    let mut data_q = sqlx::query_as::<_, VacationRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| store_error(e, "list requests"))?;

    // -------------------------
    // Response
    // -------------------------
    let response = VacationListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

async fn fetch_request(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    request_id: u64,
) -> Result<VacationRequest, EngineError> {
    sqlx::query_as::<_, VacationRequest>(&format!("{} WHERE id = ?", SELECT_REQUEST))
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| store_error(e, "reload request"))?
        .ok_or(EngineError::NotFound(request_id))
}
