use crate::{
    auth::auth::AuthUser,
    model::{role::Role, user::User},
    store::mysql::is_duplicate,
    utils::db_utils::{Filter, SqlValue, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, role, department, created_at, updated_at";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Siti Rahma")]
    pub name: String,
    #[schema(example = "siti@company.com", format = "email", value_type = String)]
    pub email: String,
    #[serde(default)]
    #[schema(example = "employee")]
    pub role: Role,
    #[schema(example = "Finance", nullable = true)]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
    /// Filter by department
    pub department: Option<String>,
    /// Filter by role
    pub role: Option<Role>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Partial profile update; absent fields are left untouched and an empty
/// `department` clears it.
#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    #[schema(format = "email", value_type = Option<String>)]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
}

impl UpdateEmployee {
    fn into_sets(self) -> Result<Vec<(&'static str, SqlValue)>, &'static str> {
        let mut sets = Vec::new();

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err("name cannot be empty");
            }
            sets.push(("name", SqlValue::String(name)));
        }

        if let Some(email) = self.email {
            let email = normalize_email(&email).ok_or("email is invalid")?;
            sets.push(("email", SqlValue::String(email)));
        }

        if let Some(role) = self.role {
            sets.push(("role", SqlValue::String(role.to_string())));
        }

        if let Some(department) = self.department {
            let value = match department.trim() {
                "" => SqlValue::Null,
                d => SqlValue::String(d.to_string()),
            };
            sets.push(("department", value));
        }

        Ok(sets)
    }
}

fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(email)
}

fn email_taken() -> HttpResponse {
    HttpResponse::Conflict().json(json!({
        "message": "Email already registered"
    }))
}

fn employee_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "message": "Employee not found"
    }))
}

async fn fetch_user(pool: &MySqlPool, user_id: &str) -> actix_web::Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);

    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = User),
        (status = 400, description = "Invalid name or email"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "message": "Email already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let name = payload.name.trim();
    let Some(email) = normalize_email(&payload.email) else {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "email is invalid" })));
    };
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "name is required" })));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let department = payload
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let result = sqlx::query(
        r#"
        INSERT INTO users
        (id, name, email, role, department, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(&email)
    .bind(payload.role.as_ref())
    .bind(department)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_duplicate(&e) => return Ok(email_taken()),
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    }

    info!(user_id = %id, created_by = %auth.user_id, "Employee created");

    match fetch_user(pool.get_ref(), &id).await? {
        Some(user) => Ok(HttpResponse::Created().json(user)),
        None => Err(ErrorInternalServerError("Internal Server Error")),
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page as u64 - 1).saturating_mul(per_page as u64);

    let mut filter = Filter::new();

    if let Some(department) = query.department.as_deref().filter(|d| *d != "all") {
        filter.push("department = ?", SqlValue::String(department.to_string()));
    }

    if let Some(role) = query.role {
        filter.push("role = ?", SqlValue::String(role.to_string()));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let like = format!("%{}%", search);
        filter.push_all(
            "(name LIKE ? OR email LIKE ?)",
            [SqlValue::String(like.clone()), SqlValue::String(like)],
        );
    }

    let where_sql = filter.where_sql();

    let count_sql = format!("SELECT COUNT(*) FROM users{}", where_sql);
    debug!(sql = %count_sql, "Counting employees");

    let count_query =
        crate::bind_all!(sqlx::query_scalar::<_, i64>(&count_sql), filter.values.clone());
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT {} FROM users{} ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
        USER_COLUMNS, where_sql
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let data_query = crate::bind_all!(sqlx::query_as::<_, User>(&data_sql), filter.values);
    let employees = data_query
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %data_sql, "Failed to fetch employees");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{user_id}",
    params(
        ("user_id" = String, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated successfully", body = User),
        (status = 400, description = "No or invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let mut sets = match body.into_inner().into_sets() {
        Ok(sets) => sets,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
        }
    };
    if sets.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No fields provided for update"
        })));
    }
    sets.push(("updated_at", SqlValue::DateTime(Utc::now())));

    let update = build_update_sql("users", sets, "id", SqlValue::String(user_id.clone()))?;

    match execute_update(pool.get_ref(), update).await {
        Ok(_) => {}
        Err(e) if is_duplicate(&e) => return Ok(email_taken()),
        Err(e) => {
            error!(error = %e, user_id = %user_id, "Failed to update employee");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    }

    match fetch_user(pool.get_ref(), &user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(employee_not_found()),
    }
}

/// Delete Employee together with their attendance and leave history
#[utoipa::path(
    delete,
    path = "/api/employees/{user_id}",
    params(
        ("user_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let db_error = |e: sqlx::Error| {
        error!(error = %e, user_id = %user_id, "Failed to delete employee");
        ErrorInternalServerError("Internal Server Error")
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

    if deleted == 0 {
        return Ok(employee_not_found());
    }

    for sql in [
        "DELETE FROM attendance WHERE user_id = ?",
        "DELETE FROM leaves WHERE user_id = ?",
    ] {
        sqlx::query(sql)
            .bind(&user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
    }

    tx.commit().await.map_err(db_error)?;

    info!(user_id = %user_id, deleted_by = %auth.user_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Get Employee by ID (self or admin)
#[utoipa::path(
    get,
    path = "/api/employees/{user_id}",
    params(
        ("user_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(&user_id)?;

    match fetch_user(pool.get_ref(), &user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(employee_not_found()),
    }
}
