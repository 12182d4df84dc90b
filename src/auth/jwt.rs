use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::SessionUser;

pub const SESSION_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Admin,
    Workspace,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    pub role: String,
    pub scope: Scope,
    pub exp: i64,
}

impl Claims {
    pub fn admin(email: &str) -> Self {
        Self {
            sub: email.to_string(),
            tid: None,
            role: "admin".to_string(),
            scope: Scope::Admin,
            exp: expiry(),
        }
    }

    pub fn workspace(user: &SessionUser) -> Self {
        Self {
            sub: user.email.clone(),
            tid: Some(user.account_id.clone()),
            role: user.role.clone(),
            scope: Scope::Workspace,
            exp: expiry(),
        }
    }
}

fn expiry() -> i64 {
    (Utc::now() + Duration::hours(SESSION_HOURS)).timestamp()
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}
