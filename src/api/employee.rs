use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    model::role::Capability,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

const UPDATABLE_COLUMNS: &[&str] = &[
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "department",
    "designation",
    "hire_date",
    "status",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-3000")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "Operations")]
    pub department: String,
    #[schema(example = "Site Supervisor")]
    pub designation: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: chrono::NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created",
            "id": 1000
        })),
        (status = 409, description = "Duplicate code or email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone, department, designation, hire_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_code.trim())
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.email.trim())
    .bind(&payload.phone)
    .bind(payload.department.trim())
    .bind(payload.designation.trim())
    .bind(payload.hire_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => Ok(HttpResponse::Created().json(json!({
            "message": "Employee created",
            "id": res.last_insert_id()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Employee code or email already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, contact the system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("department", Query, description = "Filter by department"),
        ("status", Query, description = "Filter by status"),
        ("search", Query, description = "Search by name or email")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(department.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
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
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 400, description = "Unknown field in patch"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;

    let employee_id = path.into_inner();

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Employee not found"));
    }

    Ok(HttpResponse::Ok().body("Employee updated successfully"))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;

    let employee_id = path.into_inner();

    let result = sqlx::query(r#"DELETE FROM employees WHERE id = ?"#)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Employee not found"
                })));
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = path.into_inner();

    // employees may read their own profile; everything else needs the
    // management capability
    if auth.employee_id != Some(employee_id) {
        auth.require(Capability::ManageEmployees)?;
    }

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, first_name, last_name, email, phone,
               department, designation, hire_date, status
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}
