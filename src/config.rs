use std::env;
use std::str::FromStr;

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone)]
pub struct Config {
    /// Full connection string. Takes precedence over the `db_*` parts.
    pub database_url: Option<String>,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub host: String,
    pub port: u16,

    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            db_port: parse_var("DB_PORT", 5432)?,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "biofeedback_db".into()),
            db_user: env::var("DB_USER").unwrap_or_else(|_| "postgres".into()),
            db_password: env::var("DB_PASSWORD").unwrap_or_default(),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            db_acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 8000)?,

            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or_default(),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return PgConnectOptions::from_str(url).context("DATABASE_URL is not a valid connection string");
        }

        Ok(PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_password))
    }

    /// Every origin the CORS layer should accept, primary frontend first.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_url.clone()];
        origins.extend(self.cors_extra_origins.iter().cloned());
        origins
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: None,
            db_host: "db.internal".into(),
            db_port: 5433,
            db_name: "biofeedback_db".into(),
            db_user: "journal".into(),
            db_password: "secret".into(),
            db_max_connections: 4,
            db_acquire_timeout_secs: 1,
            host: "127.0.0.1".into(),
            port: 8000,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: vec![],
        }
    }

    #[test]
    fn test_split_origins_skips_blanks() {
        let origins = split_origins(" http://a.local , ,http://b.local,");
        assert_eq!(origins, vec!["http://a.local", "http://b.local"]);
    }

    #[test]
    fn test_allowed_origins_puts_frontend_first() {
        let mut config = base_config();
        config.cors_extra_origins = vec!["http://192.168.1.20:3000".into()];
        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:3000", "http://192.168.1.20:3000"]
        );
    }

    #[test]
    fn test_listen_addr() {
        assert_eq!(base_config().listen_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_connect_options_from_parts() {
        let opts = base_config().connect_options().unwrap();
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 5433);
        assert_eq!(opts.get_database(), Some("biofeedback_db"));
        assert_eq!(opts.get_username(), "journal");
    }

    #[test]
    fn test_connect_options_prefers_url() {
        let mut config = base_config();
        config.database_url = Some("postgres://u:p@elsewhere:6543/other".into());
        let opts = config.connect_options().unwrap();
        assert_eq!(opts.get_host(), "elsewhere");
        assert_eq!(opts.get_port(), 6543);
        assert_eq!(opts.get_database(), Some("other"));
    }

    #[test]
    fn test_connect_options_rejects_bad_url() {
        let mut config = base_config();
        config.database_url = Some("not a url".into());
        assert!(config.connect_options().is_err());
    }
}
