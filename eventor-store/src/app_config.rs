use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `None` runs the API without a store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
    /// Serve from process memory instead of Postgres. Data is lost on restart.
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_days: i64,
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Probability in [0, 1] that the simulated gateway approves a charge.
    pub success_rate: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub emails: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Layers `default`, `{RUN_MODE}` and `local` files from `dir`, then
    /// `EVENTOR__SECTION__KEY` environment variables. `DATABASE_URL` wins over
    /// everything for the store connection string.
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let file = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = config::Config::builder()
            .add_source(config::File::with_name(&file("default")))
            .add_source(config::File::with_name(&file(&run_mode)).required(false))
            .add_source(config::File::with_name(&file("local")).required(false))
            .add_source(
                config::Environment::with_prefix("EVENTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("admin.emails")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        let mut cfg: Config = s.try_deserialize()?;
        cfg.database.url = cfg.database.url.filter(|u| !u.trim().is_empty());
        cfg.admin.emails = cfg
            .admin
            .emails
            .iter()
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");
        let cfg = Config::load_from(&dir).expect("default config should parse");
        assert_eq!(cfg.auth.session_days, 7);
        assert!((cfg.payments.success_rate - 0.9).abs() < f64::EPSILON);
        assert!(cfg.payments.min_latency_ms <= cfg.payments.max_latency_ms);
    }
}
