use serde::Deserialize;

/// Top-level server configuration, loaded from `lineups.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    /// Contest catalog file. The built-in catalog is used when unset.
    pub catalog_path: Option<String>,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "public".to_string(),
            catalog_path: None,
            limits: LimitsConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            ws_rate_limit_per_sec: 20.0,
            player_message_buffer: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidListenAddr(String),
    NonPositiveLimit(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidListenAddr(addr) => {
                write!(f, "listen_addr is not a valid socket address: {addr}")
            },
            Self::NonPositiveLimit(name) => write!(f, "limits.{name} must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

const CONFIG_FILE: &str = "lineups.toml";

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }
        if self.limits.max_ws_connections == 0 {
            return Err(ConfigError::NonPositiveLimit("max_ws_connections"));
        }
        if self.limits.ws_rate_limit_per_sec.is_nan() || self.limits.ws_rate_limit_per_sec <= 0.0 {
            return Err(ConfigError::NonPositiveLimit("ws_rate_limit_per_sec"));
        }
        if self.limits.player_message_buffer == 0 {
            return Err(ConfigError::NonPositiveLimit("player_message_buffer"));
        }
        Ok(())
    }

    /// Load config from `lineups.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from {CONFIG_FILE}");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {CONFIG_FILE}: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No {CONFIG_FILE} found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `LINEUPS_*` overrides. Empty or unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = var("LINEUPS_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = var("LINEUPS_WEB_ROOT") {
            self.web_root = root;
        }
        if let Some(path) = var("LINEUPS_CATALOG") {
            self.catalog_path = Some(path);
        }
        if let Some(n) = var("LINEUPS_MAX_WS_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.limits.max_ws_connections = n;
        }
        if let Some(n) = var("LINEUPS_WS_RATE_LIMIT").and_then(|v| v.parse().ok()) {
            self.limits.ws_rate_limit_per_sec = n;
        }
    }
}
