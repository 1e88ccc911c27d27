use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub org_id: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub organization_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Every scheduling operation is scoped to the caller's organization;
    /// tokens without one cannot touch engine data.
    pub fn require_organization(&self) -> Result<Uuid, AppError> {
        let org = self
            .organization_id
            .as_deref()
            .ok_or_else(|| AppError::Auth("Token is missing organization context".to_string()))?;

        Uuid::parse_str(org)
            .map_err(|_| AppError::Auth("Token carries an invalid organization id".to_string()))
    }
}
