use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration
    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    // Organization lives in a top-level claim, or in app_metadata on
    // tokens minted by the Supabase dashboard.
    let organization_id = claims.org_id.clone().or_else(|| {
        claims
            .app_metadata
            .as_ref()
            .and_then(|meta| meta.get("organization_id"))
            .and_then(|value| value.as_str())
            .map(String::from)
    });

    let created_at = claims
        .iat
        .map(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        organization_id,
        created_at: created_at.flatten(),
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};

    #[test]
    fn validates_token_and_extracts_organization() {
        let user = TestUser::agent("agent@example.com");
        let secret = "test-secret-key-for-jwt-validation-must-be-long-enough";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        let validated = validate_token(&token, secret).expect("token should validate");

        assert_eq!(validated.id, user.id);
        assert_eq!(validated.organization_id, Some(user.organization_id.clone()));
        assert_eq!(validated.role, Some("agent".to_string()));
    }

    #[test]
    fn rejects_expired_token() {
        let user = TestUser::agent("agent@example.com");
        let secret = "test-secret-key-for-jwt-validation-must-be-long-enough";
        let token = JwtTestUtils::create_expired_token(&user, secret);

        let err = validate_token(&token, secret).unwrap_err();
        assert_eq!(err, "Token expired");
    }

    #[test]
    fn rejects_tampered_signature() {
        let user = TestUser::agent("agent@example.com");
        let token = JwtTestUtils::create_invalid_signature_token(&user);

        assert!(validate_token(&token, "the-real-secret").is_err());
    }
}
