use crate::config::Config;
use crate::model::role::{Capability, Role};
use crate::models::Claims;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    /// Single choke point for privileged actions; handlers name the
    /// capability they need instead of matching on roles.
    pub fn require(&self, cap: Capability) -> actix_web::Result<()> {
        if self.role.grants(cap) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not permitted"))
        }
    }

    /// The employee id behind this account, required for self-service
    /// endpoints like check-in and leave submission.
    pub fn require_employee(&self) -> actix_web::Result<u64> {
        self.employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}
