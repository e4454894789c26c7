use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    model::role::Role,
    models::{LoginReqDto, RegisterReq, TokenType, UserSql},
    utils::username_cache,
    utils::username_filter,
};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Inserts a new user and keeps the availability filter and cache in step
async fn insert_user(
    username: &str,
    password: &str,
    employee_id: Option<u64>,
    pool: &MySqlPool,
) -> Result<(), HttpResponse> {
    let hashed = match hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })));
        }
    };

    // Self-registration is always an employee account; admin and HR accounts
    // are provisioned out of band.
    let result = sqlx::query(
        r#"INSERT INTO users (username, password, role_id, employee_id) VALUES (?, ?, ?, ?)"#,
    )
    .bind(username)
    .bind(hashed)
    .bind(Role::Employee as u8)
    .bind(employee_id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            username_filter::insert(username);
            username_cache::mark_taken(username).await;
            Ok(())
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Err(HttpResponse::Conflict().json(json!({
                        "error": "Username already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to insert user");
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })))
        }
    }
}

/// true  => username AVAILABLE
/// false => username TAKEN
pub async fn is_username_available(username: &str, pool: &MySqlPool) -> bool {
    let username = username.to_lowercase();

    // 1️⃣ Cuckoo filter — a definite "never seen" skips everything else
    if !username_filter::might_exist(&username) {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if username_cache::is_taken(&username).await {
        return false;
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(&username)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub username: String,
}

/// Availability probe used by the registration form
pub async fn username_available(
    query: web::Query<AvailabilityQuery>,
    pool: web::Data<MySqlPool>,
) -> impl Responder {
    let available = is_username_available(query.username.trim(), pool.get_ref()).await;
    HttpResponse::Ok().json(json!({ "available": available }))
}

/// User registration handler
pub async fn register(user: web::Json<RegisterReq>, pool: web::Data<MySqlPool>) -> impl Responder {
    let username = user.username.trim();
    let password = &user.password;

    if username.is_empty() || password.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Username and password must not be empty"
        }));
    }

    if !is_username_available(username, pool.get_ref()).await {
        return HttpResponse::Conflict().json(json!({
            "error": "Username already taken"
        }));
    }

    match insert_user(username, password, user.employee_id, pool.get_ref()).await {
        Ok(_) => HttpResponse::Created().json(json!({
            "message": "User registered successfully"
        })),
        Err(err_resp) => err_resp,
    }
}

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().body("Username or password required");
    }

    debug!("Fetching user from database");

    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, employee_id
        FROM users
        WHERE username = ? AND is_active = TRUE
        "#,
    )
    .bind(&user.username)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    debug!("Password verified, generating tokens");

    let access_token = match generate_access_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        db_user.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (refresh_token, refresh_claims) = match generate_refresh_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        db_user.employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "Failed to sign refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    debug!(
        user_id = db_user.id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(db_user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

#[get("/protected")]
pub async fn protected(req: HttpRequest) -> impl Responder {
    match req.extensions().get::<crate::auth::auth::AuthUser>() {
        Some(user) => HttpResponse::Ok().body(user.username.clone()),
        None => HttpResponse::Unauthorized().body("No user"),
    }
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // 🔍 the token must still be live in the database
    let record = match sqlx::query_as::<_, (u64, u64, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (record_id, user_id) = match record {
        Some((id, user_id, revoked)) if !revoked => (id, user_id),
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // 🔥 rotate: revoke the old one before issuing a replacement
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let (new_refresh_token, new_claims) = match generate_refresh_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        claims.employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "Failed to sign refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store rotated refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let access_token = match generate_access_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        claims.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // revoke is idempotent; success even if the token never existed
    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await;

    HttpResponse::NoContent().finish()
}
