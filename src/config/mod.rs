use std::env;
use std::str::FromStr;

use serde::Serialize;

/// Stats windows offered by the dashboard, in days.
pub const ALLOWED_WINDOWS: [u32; 3] = [7, 30, 90];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub store_page_limit: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub site: SiteSettings,
}

/// Site-wide settings, loaded once at startup and served read-only.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSettings {
    pub site_name: String,
    pub allow_registration: bool,
    pub default_window_days: u32,
    pub top_prompts_limit: usize,
    pub prompt_truncate_length: usize,
    pub growth_months: usize,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Image Studio".to_string(),
            allow_registration: true,
            default_window_days: 30,
            top_prompts_limit: 10,
            prompt_truncate_length: 50,
            growth_months: 6,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = SiteSettings::default();
        Ok(Self {
            store_url: env::var("STORE_URL")?.trim_end_matches('/').to_string(),
            store_api_key: env::var("STORE_API_KEY")?,
            store_page_limit: env_or("STORE_PAGE_LIMIT", 1000),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("BACKEND_PORT", 3000),
            jwt_secret: env::var("JWT_SECRET")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            site: SiteSettings {
                site_name: env::var("SITE_NAME").unwrap_or(defaults.site_name),
                allow_registration: env_or("ALLOW_REGISTRATION", defaults.allow_registration),
                default_window_days: offered_window_or(
                    env_or("DEFAULT_WINDOW_DAYS", defaults.default_window_days),
                    defaults.default_window_days,
                ),
                top_prompts_limit: env_or("TOP_PROMPTS_LIMIT", defaults.top_prompts_limit),
                prompt_truncate_length: env_or(
                    "PROMPT_TRUNCATE_LENGTH",
                    defaults.prompt_truncate_length,
                ),
                growth_months: env_or("GROWTH_MONTHS", defaults.growth_months),
            },
        })
    }
}

/// Read and parse an optional variable, falling back on absence or parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Keep `days` if the dashboard offers that window, otherwise use `fallback`.
fn offered_window_or(days: u32, fallback: u32) -> u32 {
    if ALLOWED_WINDOWS.contains(&days) {
        return days;
    }
    tracing::warn!(
        configured = days,
        fallback,
        allowed = ?ALLOWED_WINDOWS,
        "DEFAULT_WINDOW_DAYS is not an offered window, using fallback"
    );
    fallback
}
