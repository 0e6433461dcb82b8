use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidValue { name, value }),
    }
}

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") => Ok(LogFormat::default()),
            Some(v) if v.eq_ignore_ascii_case("json") => Ok(LogFormat::Json),
            Some(v) if v.eq_ignore_ascii_case("pretty") => Ok(LogFormat::Pretty),
            Some(v) => Err(ConfigError::InvalidValue {
                name: "LOG_FORMAT",
                value: v.to_string(),
            }),
        }
    }
}

/// todo-api サーバの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ApiConfig {
    /// 環境変数 HOST / PORT から読み込む（未設定なら 127.0.0.1:8000）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup("HOST") {
            Some(value) => parse_var("HOST", value)?,
            None => DEFAULT_HOST,
        };
        let port = match lookup("PORT") {
            Some(value) => parse_var("PORT", value)?,
            None => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// todo-mcp アダプタの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    /// todo-api のベース URL（末尾の `/` は除去済み）
    pub api_base_url: String,
}

impl McpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup("TODO_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base = raw.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                name: "TODO_API_BASE_URL",
                value: raw,
            });
        }

        Ok(Self {
            api_base_url: base.to_string(),
        })
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}
