use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub availability_max_range_days: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            availability_max_range_days: 31,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            availability_max_range_days: self.availability_max_range_days,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub organization_id: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "agent".to_string(),
            organization_id: Uuid::new_v4().to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            organization_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn agent(email: &str) -> Self {
        Self::new(email, "agent")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn in_organization(mut self, organization_id: &str) -> Self {
        self.organization_id = organization_id.to_string();
        self
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            organization_id: Some(self.organization_id.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "org_id": user.organization_id,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST row payloads for wiremock-backed tests.
pub struct MockPostgrestResponses;

impl MockPostgrestResponses {
    pub fn schedule_response(schedule_id: &str, organization_id: &str, timezone: &str) -> serde_json::Value {
        json!({
            "id": schedule_id,
            "organization_id": organization_id,
            "name": "Main agenda",
            "color": "#4f46e5",
            "timezone": timezone,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn provider_response(
        provider_id: &str,
        organization_id: &str,
        schedule_id: &str,
        display_name: &str,
    ) -> serde_json::Value {
        json!({
            "id": provider_id,
            "organization_id": organization_id,
            "schedule_id": schedule_id,
            "profile_id": Uuid::new_v4(),
            "display_name": display_name,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn service_response(
        service_id: &str,
        organization_id: &str,
        title: &str,
        duration_minutes: i32,
    ) -> serde_json::Value {
        json!({
            "id": service_id,
            "organization_id": organization_id,
            "title": title,
            "duration_minutes": duration_minutes,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn window_response(
        provider_id: &str,
        organization_id: &str,
        day_of_week: i32,
        start_time: &str,
        end_time: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "organization_id": organization_id,
            "provider_id": provider_id,
            "day_of_week": day_of_week,
            "start_time": start_time,
            "end_time": end_time,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn exception_response(
        organization_id: &str,
        provider_id: Option<&str>,
        schedule_id: Option<&str>,
        date: &str,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "organization_id": organization_id,
            "provider_id": provider_id,
            "schedule_id": schedule_id,
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "reason": "Blocked",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        organization_id: &str,
        provider_id: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "organization_id": organization_id,
            "schedule_id": Uuid::new_v4(),
            "provider_id": provider_id,
            "customer_id": Uuid::new_v4(),
            "service_id": Uuid::new_v4(),
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "status": status,
            "has_videoconference": false,
            "chat_id": null,
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert_eq!(app_config.availability_max_range_days, 31);
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::agent("agent@example.com");
        assert_eq!(user.email, "agent@example.com");
        assert_eq!(user.role, "agent");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.organization_id, Some(user.organization_id.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }
}
