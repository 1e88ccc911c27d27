use std::env;
use tracing::warn;

const DEFAULT_MAX_RANGE_DAYS: i64 = 31;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub availability_max_range_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            availability_max_range_days: env::var("AVAILABILITY_MAX_RANGE_DAYS")
                .ok()
                .and_then(|value| value.parse::<i64>().ok())
                .filter(|days| *days > 0)
                .unwrap_or_else(|| {
                    warn!(
                        "AVAILABILITY_MAX_RANGE_DAYS not set or invalid, using default of {} days",
                        DEFAULT_MAX_RANGE_DAYS
                    );
                    DEFAULT_MAX_RANGE_DAYS
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}
