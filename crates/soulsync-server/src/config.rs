use tracing::warn;

/// Placeholder secrets that sign tokens anyone could forge.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const DEFAULT_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub secret_key: String,
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read configuration from the environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = std::env::var("SOULSYNC_SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET.into());
        if secret_key.is_empty() || PLACEHOLDER_SECRETS.contains(&secret_key.as_str()) {
            warn!("SOULSYNC_SECRET_KEY is unset or a placeholder; session tokens are forgeable. Do not use this outside development.");
        }

        Ok(Self {
            secret_key,
            database_url: database_url(),
            host: std::env::var("SOULSYNC_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("SOULSYNC_PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()?,
        })
    }
}

/// Shared with the seed binary, which needs nothing else.
pub fn database_url() -> String {
    std::env::var("SOULSYNC_DATABASE_URL").unwrap_or_else(|_| "soulsync.db".into())
}
