use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub db: DbConfig,
    pub commands: CommandsConfig,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub enable_cors: bool,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig { pub token: String }

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandMode {
    Log,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    pub mode: CommandMode,
    #[serde(default)]
    pub gateway_url: Option<String>,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig { pub topology_file: PathBuf }

fn default_request_timeout_secs() -> u64 { 30 }
fn default_max_connections() -> u32 { 10 }
fn default_acquire_timeout_secs() -> u64 { 5 }
fn default_http_timeout_seconds() -> u64 { 5 }

impl Config {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("FLISR__").split("__")),
        )
    }

    /// Parse a complete configuration from TOML text, without env overrides
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(raw)))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }
}
