use crate::auth::auth::AuthUser;
use crate::model::leave_request::{LeaveListRow, LeaveRequest, LeaveStatus, LeaveType};
use crate::utils::db_utils::{Filter, SqlValue};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};

const LEAVE_COLUMNS: &str = "id, user_id, leave_type, start_date, end_date, status, reason, created_at";

// users has no FK from leaves, so requests from profile-less subjects keep NULL names
const LEAVE_LIST_FROM: &str = r#"
    SELECT
        l.id, l.user_id, l.leave_type, l.start_date, l.end_date, l.status, l.reason, l.created_at,
        u.name, u.email, u.department
    FROM leaves l
    LEFT JOIN users u ON u.id = l.user_id
"#;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: String,
}

impl CreateLeave {
    fn validate(&self) -> Result<(), &'static str> {
        if self.start_date > self.end_date {
            return Err("start_date cannot be after end_date");
        }
        if self.reason.trim().is_empty() {
            return Err("reason is required");
        }
        Ok(())
    }
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "user_id": "5d0c6f6e-6a53-4c86-9d3a-0b1f0f3c1a11",
            "leave_type": "sick",
            "start_date": "2026-01-01",
            "end_date": "2026-01-03",
            "status": "pending",
            "reason": "Flu",
            "created_at": "2026-01-01T00:00:00Z",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "department": "Engineering"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveListRow>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by user ID
    pub user_id: Option<String>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

async fn fetch_leave(pool: &MySqlPool, leave_id: u64) -> actix_web::Result<Option<LeaveRequest>> {
    let sql = format!("SELECT {} FROM leaves WHERE id = ?", LEAVE_COLUMNS);

    sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Failed to fetch leave request");
            ErrorInternalServerError("Internal Server Error")
        })
}

fn leave_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "message": "Leave request not found"
    }))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "message": "start_date cannot be after end_date"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "create_leave", skip_all, fields(user_id = %auth.user_id))]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (user_id, leave_type, start_date, end_date, status, reason)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&auth.user_id)
    .bind(payload.leave_type.as_ref())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(payload.reason.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = fetch_leave(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?;

    info!(leave_id = leave.id, leave_type = %payload.leave_type, "Leave request submitted");
    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Caller's own leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses(
        (status = 200, description = "Caller's leave requests, latest start first", body = Vec<LeaveRequest>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!(
        "SELECT {} FROM leaves WHERE user_id = ? ORDER BY start_date DESC, id DESC",
        LEAVE_COLUMNS
    );

    let leaves = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(&auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %auth.user_id, "Failed to fetch own leave requests");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Decide a leave request (admin)
========================= */
async fn decide_leave(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    decision: LeaveStatus,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    // a decided request may be re-decided; only an unknown id is refused
    sqlx::query("UPDATE leaves SET status = ? WHERE id = ?")
        .bind(decision.as_ref())
        .bind(leave_id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Leave decision failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // rows_affected is 0 for an unchanged status too, so existence is read back
    match fetch_leave(pool, leave_id).await? {
        Some(leave) => {
            info!(leave_id, decided_by = %auth.user_id, status = %decision, "Leave request decided");
            Ok(HttpResponse::Ok().json(leave))
        }
        None => Ok(leave_not_found()),
    }
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide_leave(auth, pool.get_ref(), path.into_inner(), LeaveStatus::Approved).await
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide_leave(auth, pool.get_ref(), path.into_inner(), LeaveStatus::Rejected).await
}

/// Single leave request (owner or admin)
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    match fetch_leave(pool.get_ref(), leave_id).await? {
        Some(leave) => {
            auth.require_self_or_admin(&leave.user_id)?;
            Ok(HttpResponse::Ok().json(leave))
        }
        None => Ok(leave_not_found()),
    }
}

/// All leave requests (admin), paginated
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list joined with requester profiles", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).clamp(1, u32::MAX as u64);
    let offset = (page - 1).saturating_mul(per_page);

    let mut filter = Filter::new();

    if let Some(user_id) = query.user_id.as_deref() {
        filter.push("l.user_id = ?", SqlValue::String(user_id.to_string()));
    }

    if let Some(status) = query.status {
        filter.push("l.status = ?", SqlValue::String(status.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leaves l{}", filter.where_sql());
    let count_q = crate::bind_all!(sqlx::query_scalar::<_, i64>(&count_sql), filter.values.clone());

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count leave requests");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "{}{} ORDER BY l.created_at DESC, l.id DESC LIMIT ? OFFSET ?",
        LEAVE_LIST_FROM,
        filter.where_sql()
    );
    let data_q = crate::bind_all!(sqlx::query_as::<_, LeaveListRow>(&data_sql), filter.values);

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch leave list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
