use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::AttendanceRecord;
use crate::model::office::GeoPoint;
use crate::store::AttendanceStore;
use crate::store::mysql::{ATTENDANCE_COLUMNS, AttendanceRow};
use crate::tracking::clock::Clock;
use crate::tracking::day_tracker::DayWindow;
use crate::tracking::service;
use crate::utils::db_utils::{Filter, SqlValue};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, MySqlPool};
use tracing::{error, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct LocationCheckResponse {
    #[schema(example = true)]
    pub allowed: bool,
    /// Meters from the office center (0 when geofencing is disabled)
    #[schema(example = 42.7)]
    pub distance: f64,
    #[schema(example = 100.0)]
    pub radius: f64,
    #[schema(example = true)]
    pub enabled: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ClockResponse {
    #[schema(example = "Clocked in successfully")]
    pub message: String,
    pub record: AttendanceRecord,
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of past days to include
    pub days: Option<u32>,
}

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// First day, inclusive
    #[param(value_type = Option<String>, format = Date, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Last day, inclusive
    #[param(value_type = Option<String>, format = Date, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    /// Department name, or "all"
    #[param(example = "Finance")]
    pub department: Option<String>,
}

/// Attendance row joined with the owner's profile.
#[derive(Serialize, FromRow, ToSchema)]
pub struct AttendanceReportRow {
    pub id: u64,
    pub user_id: String,
    #[schema(format = "date-time", value_type = String)]
    pub work_date: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_out_time: Option<DateTime<Utc>>,
    #[schema(example = "present")]
    pub status: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AdminStats {
    #[schema(example = 42)]
    pub total_employees: i64,
    #[schema(example = 37)]
    pub today_present: i64,
    #[schema(example = 3)]
    pub pending_leaves: i64,
}

fn invalid_position() -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "message": "latitude must be within [-90, 90] and longitude within [-180, 180]"
    }))
}

const REPORT_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.work_date, a.check_in_time, a.check_out_time, a.status,
           u.name, u.email, u.department
    FROM attendance a
    LEFT JOIN users u ON u.id = a.user_id
"#;

async fn fetch_report(
    pool: &MySqlPool,
    filter: Filter,
) -> actix_web::Result<Vec<AttendanceReportRow>> {
    let sql = format!("{}{} ORDER BY a.work_date DESC, a.id DESC", REPORT_SELECT, filter.where_sql());

    let query = crate::bind_all!(sqlx::query_as::<_, AttendanceReportRow>(&sql), filter.values);
    query.fetch_all(pool).await.map_err(|e| {
        error!(error = %e, sql = %sql, "Failed to fetch attendance report");
        ErrorInternalServerError("Internal Server Error")
    })
}

async fn fetch_records(
    pool: &MySqlPool,
    filter: Filter,
    order: &str,
) -> actix_web::Result<Vec<AttendanceRecord>> {
    let sql = format!(
        "SELECT {} FROM attendance{} ORDER BY {}",
        ATTENDANCE_COLUMNS,
        filter.where_sql(),
        order
    );

    let query = crate::bind_all!(sqlx::query_as::<_, AttendanceRow>(&sql), filter.values);
    let rows = query.fetch_all(pool).await.map_err(|e| {
        error!(error = %e, "Failed to fetch attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    rows.into_iter()
        .map(AttendanceRow::into_domain)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!(error = %e, "Malformed attendance row");
            ErrorInternalServerError("Internal Server Error")
        })
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    request_body(content = GeoPoint, description = "Position reported by the device"),
    responses(
        (status = 200, description = "Clocked in successfully", body = ClockResponse),
        (status = 400, description = "Already clocked in today or invalid coordinates", body = Object, example = json!({
            "code": "already_processed",
            "message": "Attendance for today has already been recorded"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the office area", body = Object, example = json!({
            "code": "out_of_range",
            "message": "You are outside the office area. Distance: 512m (Max: 100m). Detected location: -6.195400, 106.816666",
            "distance": 512.0,
            "radius": 100.0,
            "latitude": -6.1954,
            "longitude": 106.816666
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "clock_in", skip_all, fields(user_id = %auth.user_id))]
pub async fn clock_in(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<Clock>,
    payload: web::Json<GeoPoint>,
) -> actix_web::Result<HttpResponse> {
    let position = payload.into_inner();
    if !position.is_valid() {
        return Ok(invalid_position());
    }

    let record = service::clock_in(store.get_ref(), &auth.user_id, position, clock.now()).await?;

    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Clocked in successfully".into(),
        record,
    }))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    request_body(content = GeoPoint, description = "Position reported by the device"),
    responses(
        (status = 200, description = "Clocked out successfully", body = ClockResponse),
        (status = 400, description = "Not clocked in today, or already clocked out", body = Object, example = json!({
            "code": "not_clocked_in",
            "message": "You have not clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the office area"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "clock_out", skip_all, fields(user_id = %auth.user_id))]
pub async fn clock_out(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<Clock>,
    payload: web::Json<GeoPoint>,
) -> actix_web::Result<HttpResponse> {
    let position = payload.into_inner();
    if !position.is_valid() {
        return Ok(invalid_position());
    }

    let record = service::clock_out(store.get_ref(), &auth.user_id, position, clock.now()).await?;

    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Clocked out successfully".into(),
        record,
    }))
}

/// Tells the client whether its current position would pass the geofence
#[utoipa::path(
    post,
    path = "/api/attendance/location-check",
    request_body = GeoPoint,
    responses(
        (status = 200, description = "Geofence verdict", body = LocationCheckResponse),
        (status = 400, description = "Invalid coordinates"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn location_check(
    _auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    payload: web::Json<GeoPoint>,
) -> actix_web::Result<HttpResponse> {
    let position = payload.into_inner();
    if !position.is_valid() {
        return Ok(invalid_position());
    }

    let result = service::check_location(store.get_ref(), position).await?;

    Ok(HttpResponse::Ok().json(LocationCheckResponse {
        allowed: result.check.allowed,
        distance: result.check.distance,
        radius: result.config.radius_meters,
        enabled: result.config.enabled,
    }))
}

/// Caller's attendance record for today, or null
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record (null when not clocked in)", body = AttendanceRecord),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<Clock>,
) -> actix_web::Result<impl Responder> {
    let window = DayWindow::today(&clock.now());

    let record = store
        .load_today_record(&auth.user_id, window)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %auth.user_id, "Failed to load today's attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(record))
}

/// Caller's recent attendance, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance history", body = Vec<AttendanceRecord>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let days = query.days.unwrap_or(config.history_default_days).min(366);
    let since = clock.now().with_timezone(&Utc) - Duration::days(days as i64);

    let mut filter = Filter::new();
    filter
        .push("user_id = ?", SqlValue::String(auth.user_id.clone()))
        .push("work_date >= ?", SqlValue::DateTime(since));

    let records = fetch_records(pool.get_ref(), filter, "work_date DESC").await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Full attendance of one user (self or admin)
#[utoipa::path(
    get,
    path = "/api/attendance/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Attendance of the user, oldest first", body = Vec<AttendanceRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn user_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(&user_id)?;

    let mut filter = Filter::new();
    filter.push("user_id = ?", SqlValue::String(user_id));

    let records = fetch_records(pool.get_ref(), filter, "work_date ASC").await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Everyone's attendance for today (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/admin/today",
    responses(
        (status = 200, description = "Today's attendance with user details", body = Vec<AttendanceReportRow>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn admin_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<Clock>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let window = DayWindow::today(&clock.now());
    let mut filter = Filter::new();
    filter
        .push("a.work_date >= ?", SqlValue::DateTime(window.start))
        .push("a.work_date < ?", SqlValue::DateTime(window.end));

    let rows = fetch_report(pool.get_ref(), filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Attendance report filtered by date range and department (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/admin/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Matching attendance rows", body = Vec<AttendanceReportRow>),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "start_date cannot be after end_date"
            })));
        }
    }

    let mut filter = Filter::new();

    if let Some(window) = query.start_date.and_then(|d| DayWindow::for_date(&Local, d)) {
        filter.push("a.work_date >= ?", SqlValue::DateTime(window.start));
    }

    // end_date is inclusive: everything before the following midnight
    if let Some(window) = query.end_date.and_then(|d| DayWindow::for_date(&Local, d)) {
        filter.push("a.work_date < ?", SqlValue::DateTime(window.end));
    }

    if let Some(department) = query.department.as_deref().filter(|d| *d != "all") {
        filter.push("u.department = ?", SqlValue::String(department.to_string()));
    }

    let rows = fetch_report(pool.get_ref(), filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Headline numbers for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/attendance/admin/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = AdminStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn admin_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<Clock>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let window = DayWindow::today(&clock.now());
    let db_error = |e: sqlx::Error| {
        error!(error = %e, "Failed to compute admin stats");
        ErrorInternalServerError("Internal Server Error")
    };

    let total_employees =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'employee'")
            .fetch_one(pool.get_ref())
            .await
            .map_err(db_error)?;

    let today_present = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE work_date >= ? AND work_date < ?",
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_one(pool.get_ref())
    .await
    .map_err(db_error)?;

    let pending_leaves =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leaves WHERE status = 'pending'")
            .fetch_one(pool.get_ref())
            .await
            .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(AdminStats {
        total_employees,
        today_present,
        pending_leaves,
    }))
}
