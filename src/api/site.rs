use crate::auth::auth::AuthUser;
use crate::model::role::Capability;
use crate::model::site::Site;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateSite {
    #[schema(example = "Riverside Tower")]
    pub name: String,
    #[schema(example = "12 Quay Street")]
    pub address: String,
    #[schema(example = 23.7806)]
    pub latitude: f64,
    #[schema(example = 90.4193)]
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
    pub daily_tasks: Option<String>,
    pub entry_policy: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSite {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub daily_tasks: Option<String>,
    pub entry_policy: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SiteQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter on active flag; omit for all sites
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct SiteListResponse {
    pub data: Vec<Site>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn validate_geometry(latitude: f64, longitude: f64, radius_meters: f64) -> Result<(), &'static str> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err("Coordinates must be finite numbers");
    }
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err("radius_meters must be greater than zero");
    }
    Ok(())
}

/// Create Site
#[utoipa::path(
    post,
    path = "/api/v1/sites",
    request_body = CreateSite,
    responses(
        (status = 201, description = "Site created", body = Object, example = json!({
            "message": "Site created",
            "id": 1
        })),
        (status = 400, description = "Invalid geometry"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn create_site(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSite>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageSites)?;

    if let Err(msg) = validate_geometry(payload.latitude, payload.longitude, payload.radius_meters)
    {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO sites
            (name, address, latitude, longitude, radius_meters, daily_tasks, entry_policy)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.address.trim())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_meters)
    .bind(&payload.daily_tasks)
    .bind(&payload.entry_policy)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create site");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Site created",
        "id": result.last_insert_id()
    })))
}

/// List sites
#[utoipa::path(
    get,
    path = "/api/v1/sites",
    params(SiteQuery),
    responses(
        (status = 200, description = "Paginated site list", body = SiteListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn list_sites(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SiteQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let where_clause = match query.is_active {
        Some(_) => "WHERE is_active = ?",
        None => "",
    };

    let count_sql = format!("SELECT COUNT(*) FROM sites {}", where_clause);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(active) = query.is_active {
        count_q = count_q.bind(active);
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count sites");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, name, address, latitude, longitude, radius_meters,
               daily_tasks, entry_policy, is_active, created_at
        FROM sites {}
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
        where_clause
    );
    let mut data_q = sqlx::query_as::<_, Site>(&data_sql);
    if let Some(active) = query.is_active {
        data_q = data_q.bind(active);
    }

    let sites = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch sites");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(SiteListResponse {
        data: sites,
        page,
        per_page,
        total,
    }))
}

/// Get Site by ID
#[utoipa::path(
    get,
    path = "/api/v1/sites/{site_id}",
    params(("site_id" = u64, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site found", body = Site),
        (status = 404, description = "Site not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn get_site(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let site_id = path.into_inner();

    let site = sqlx::query_as::<_, Site>(
        r#"
        SELECT id, name, address, latitude, longitude, radius_meters,
               daily_tasks, entry_policy, is_active, created_at
        FROM sites
        WHERE id = ?
        "#,
    )
    .bind(site_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, site_id, "Failed to fetch site");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match site {
        Some(s) => Ok(HttpResponse::Ok().json(s)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        }))),
    }
}

/// Update Site
#[utoipa::path(
    put,
    path = "/api/v1/sites/{site_id}",
    params(("site_id" = u64, Path, description = "Site ID")),
    request_body = UpdateSite,
    responses(
        (status = 200, description = "Site updated"),
        (status = 400, description = "Invalid geometry"),
        (status = 404, description = "Site not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn update_site(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateSite>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageSites)?;

    let site_id = path.into_inner();

    if let Some(radius) = body.radius_meters {
        if !radius.is_finite() || radius <= 0.0 {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "radius_meters must be greater than zero"
            })));
        }
    }
    if let (Some(lat), Some(lon)) = (body.latitude, body.longitude) {
        if !lat.is_finite() || !lon.is_finite() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Coordinates must be finite numbers"
            })));
        }
    }

    let result = sqlx::query(
        r#"
        UPDATE sites SET
            name = COALESCE(?, name),
            address = COALESCE(?, address),
            latitude = COALESCE(?, latitude),
            longitude = COALESCE(?, longitude),
            radius_meters = COALESCE(?, radius_meters),
            daily_tasks = COALESCE(?, daily_tasks),
            entry_policy = COALESCE(?, entry_policy),
            is_active = COALESCE(?, is_active)
        WHERE id = ?
        "#,
    )
    .bind(&body.name)
    .bind(&body.address)
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(body.radius_meters)
    .bind(&body.daily_tasks)
    .bind(&body.entry_policy)
    .bind(body.is_active)
    .bind(site_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, site_id, "Failed to update site");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Site updated"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_negative_radius_is_rejected() {
        assert!(validate_geometry(0.0, 0.0, 0.0).is_err());
        assert!(validate_geometry(0.0, 0.0, -5.0).is_err());
        assert!(validate_geometry(0.0, 0.0, 0.1).is_ok());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        assert!(validate_geometry(f64::NAN, 0.0, 10.0).is_err());
        assert!(validate_geometry(0.0, f64::INFINITY, 10.0).is_err());
    }
}
