use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Required when `backend = "redis"`; `REDIS_URL` fills it when blank.
    #[serde(default)]
    pub redis_url: String,
    /// JSON file the memory backend reloads from and writes through to.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    /// Initial admin API key, seeded into the store on startup when set.
    #[serde(default)]
    pub bootstrap_admin_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

fn default_log_format() -> String { "compact".to_string() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Defaults only when the file does not exist; unreadable or malformed files are errors.
pub fn load_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).map_err(|e| anyhow!("invalid config file {path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow!("cannot read config file {path}: {e}")),
    }
}

impl AppConfig {
    /// Config file when present, otherwise defaults; env fallbacks apply either way.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_or_default(&config_path())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.store.normalize_from_env();
        self.store.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() { self.host = host; }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            match backend.trim().to_ascii_lowercase().as_str() {
                "redis" => self.backend = StoreBackend::Redis,
                "memory" => self.backend = StoreBackend::Memory,
                _ => {}
            }
        }
        if self.redis_url.trim().is_empty() {
            if let Ok(url) = std::env::var("REDIS_URL") {
                self.redis_url = url;
            }
        }
        if self.bootstrap_admin_key.is_none() {
            self.bootstrap_admin_key = std::env::var("ADMIN_API_KEY").ok().filter(|k| !k.trim().is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend != StoreBackend::Redis {
            return Ok(());
        }
        if self.redis_url.trim().is_empty() {
            return Err(anyhow!("store.redis_url is empty; set it in config.toml or REDIS_URL"));
        }
        let lower = self.redis_url.to_lowercase();
        if !(lower.starts_with("redis://") || lower.starts_with("rediss://")) {
            return Err(anyhow!("store.redis_url must start with redis:// or rediss://"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() -> Result<()> {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            worker_threads = 2

            [store]
            backend = "redis"
            redis_url = "redis://localhost:6379"

            [logging]
            format = "json"
            "#,
        )?;
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.store.backend, StoreBackend::Redis);
        assert_eq!(cfg.logging.format, "json");
        cfg.store.validate()?;
        Ok(())
    }

    #[test]
    fn missing_sections_default_to_memory() -> Result<()> {
        let cfg: AppConfig = toml::from_str("")?;
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.logging.format, "compact");
        assert_eq!(cfg.server.host, "127.0.0.1");
        Ok(())
    }

    #[test]
    fn redis_backend_rejects_bad_url() {
        let store = StoreConfig {
            backend: StoreBackend::Redis,
            redis_url: "http://localhost".into(),
            ..Default::default()
        };
        assert!(store.validate().is_err());
    }

    #[test]
    fn zero_workers_normalized() -> Result<()> {
        let mut server = ServerConfig { host: " ".into(), port: 8080, worker_threads: Some(0) };
        server.normalize()?;
        assert_eq!(server.worker_threads, Some(4));
        assert_eq!(server.host, "127.0.0.1");
        Ok(())
    }

    #[test]
    fn missing_file_defaults_but_malformed_file_fails() -> Result<()> {
        let missing = std::env::temp_dir().join(format!("adbox_cfg_missing_{}.toml", uuid::Uuid::new_v4()));
        let cfg = load_or_default(missing.to_str().unwrap_or_default())?;
        assert_eq!(cfg.store.backend, StoreBackend::Memory);

        let path = std::env::temp_dir().join(format!("adbox_cfg_bad_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = \"not a number\"\n\n[store]\nbackend = \"redis\"\n")?;
        let loaded = load_or_default(path.to_str().unwrap_or_default());
        let _ = std::fs::remove_file(&path);
        assert!(loaded.is_err());
        Ok(())
    }

    #[test]
    fn load_from_file_reads_toml() -> Result<()> {
        let path = std::env::temp_dir().join(format!("adbox_cfg_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server]\nhost = \"127.0.0.1\"\nport = 8181\n")?;
        let cfg = load_from_file(path.to_str().unwrap_or_default())?;
        assert_eq!(cfg.server.port, 8181);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
