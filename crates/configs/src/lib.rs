use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: DEFAULT_PORT, worker_threads: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_max_connections() -> u32 { 100 }
fn default_min_connections() -> u32 { 10 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl AppConfig {
    /// Config file if present, otherwise environment only; then normalized and validated.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_from(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Fill unset values through `lookup` (normally the process environment) and validate.
    pub fn normalize_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize_from(&lookup)?;
        self.database.normalize_from(&lookup);
        self.database.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host;
        }
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if let Some(raw) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.port = raw
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow!("PORT must be a number in 1..=65535, got {raw:?}"))?;
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads.is_none() {
            self.worker_threads = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok());
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    /// Fill the URL from `DATABASE_URL`, or assemble it from the `DB_*` variables.
    pub fn normalize_from<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.url.trim().is_empty() {
            return;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            self.url = url;
            return;
        }
        if let Some(url) = postgres_url_from_parts(lookup) {
            self.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml, DATABASE_URL or DB_HOST/DB_USER/DB_PASSWORD/DB_NAME/DB_PORT"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

fn postgres_url_from_parts<F>(lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("DB_HOST").filter(|v| !v.trim().is_empty())?;
    let name = lookup("DB_NAME").filter(|v| !v.trim().is_empty())?;
    let user = lookup("DB_USER").unwrap_or_default();
    let password = lookup("DB_PASSWORD").unwrap_or_default();
    let port = lookup("DB_PORT")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "5432".to_string());
    let credentials = match (user.is_empty(), password.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!("{user}@"),
        (false, false) => format!("{user}:{password}@"),
    };
    Some(format!("postgres://{credentials}{host}:{port}/{name}"))
}
