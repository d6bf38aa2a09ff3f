use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Base URL of this API (e.g. https://api.evermore.example)
    pub base_url: String,
    /// Base URL of the couple-facing site (redirect targets live there)
    pub app_url: String,
    pub stripe_secret_key: Option<String>,
    /// Stripe Price ID for the one-off site purchase
    pub stripe_price_id: Option<String>,
    pub gotrue_url: Option<String>,
    pub gotrue_service_key: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub rate_limit_strict_rpm: u32,
    pub rate_limit_standard_rpm: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let app_url = env::var("APP_URL").unwrap_or_else(|_| base_url.clone());

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "evermore.db".to_string()),
            base_url,
            app_url,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok(),
            stripe_price_id: env::var("STRIPE_PRICE_ID").ok(),
            gotrue_url: env::var("GOTRUE_URL").ok(),
            gotrue_service_key: env::var("GOTRUE_SERVICE_KEY").ok(),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Evermore <hello@evermore.example>".to_string()),
            rate_limit_strict_rpm: env::var("RATE_LIMIT_STRICT_RPM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            rate_limit_standard_rpm: env::var("RATE_LIMIT_STANDARD_RPM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
