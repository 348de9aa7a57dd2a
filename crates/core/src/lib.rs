pub mod domain;
pub mod market;
pub mod projection;
pub mod recommend;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub quote_api_base_url: Option<String>,
        pub quote_api_key: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                quote_api_base_url: std::env::var("QUOTE_API_BASE_URL").ok(),
                quote_api_key: std::env::var("QUOTE_API_KEY").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_quote_api_base_url(&self) -> anyhow::Result<&str> {
            self.quote_api_base_url
                .as_deref()
                .context("QUOTE_API_BASE_URL is required")
        }
    }
}
