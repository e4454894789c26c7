use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

fn issue(
    user_id: u64,
    username: String,
    role: u8,
    employee_id: Option<u64>,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(
    user_id: u64,
    username: String,
    role: u8,
    employee_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    issue(user_id, username, role, employee_id, TokenType::Access, secret, ttl)
        .map(|(token, _)| token)
}

pub fn generate_refresh_token(
    user_id: u64,
    username: String,
    role: u8,
    employee_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    issue(user_id, username, role, employee_id, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips() {
        let token =
            generate_access_token(1, "jdoe".into(), 3, Some(1000), "secret", 900).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.sub, "jdoe");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.employee_id, Some(1000));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(1, "jdoe".into(), 3, None, "secret", 900).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
