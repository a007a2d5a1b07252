use std::net::SocketAddr;
use std::path::PathBuf;

use zeroize::Zeroizing;

/// Application-level constants
pub const APP_NAME: &str = "ClaimRx";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_FRONTEND_URL: &str = "https://claimrx.vercel.app";
pub const DEFAULT_MAIL_FROM: &str = "ClaimRx <noreply@claimrx.io>";

/// Get the application data directory (~/.claimrx). Falls back to the
/// working directory when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claimrx")
}

/// Default database location inside the data directory.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("claimrx.db")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "claimrx=info,claimrx_lib=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Runtime configuration, read once at startup.
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    /// `None` means a random per-process secret is generated.
    pub jwt_secret: Option<Zeroizing<String>>,
    pub frontend_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub password_iterations: u32,
    /// Set when a reverse proxy fronts the server and writes
    /// `X-Forwarded-For`.
    pub trust_proxy: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("CLAIMRX_BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "CLAIMRX_BIND_ADDR",
                reason: e.to_string(),
            })?,
            None => DEFAULT_BIND_ADDR.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    key: "CLAIMRX_BIND_ADDR",
                    reason: e.to_string(),
                }
            })?,
        };

        let password_iterations = match get("CLAIMRX_PASSWORD_ITERATIONS") {
            Some(raw) => {
                let n: u32 = raw.parse().map_err(|_| ConfigError::Invalid {
                    key: "CLAIMRX_PASSWORD_ITERATIONS",
                    reason: format!("not a number: {raw}"),
                })?;
                if n < 1_000 {
                    return Err(ConfigError::Invalid {
                        key: "CLAIMRX_PASSWORD_ITERATIONS",
                        reason: "must be at least 1000".into(),
                    });
                }
                n
            }
            None => crate::auth::password::DEFAULT_ITERATIONS,
        };

        let trust_proxy = match get("CLAIMRX_TRUST_PROXY") {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CLAIMRX_TRUST_PROXY",
                        reason: format!("expected true or false, got {raw}"),
                    })
                }
            },
            None => false,
        };

        Ok(Self {
            bind_addr,
            database_path: get("CLAIMRX_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            jwt_secret: get("CLAIMRX_JWT_SECRET").map(Zeroizing::new),
            frontend_url: get("CLAIMRX_FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            anthropic_model: get("CLAIMRX_ANTHROPIC_MODEL")
                .unwrap_or_else(|| crate::letters::anthropic::DEFAULT_MODEL.to_string()),
            resend_api_key: get("RESEND_API_KEY"),
            mail_from: get("CLAIMRX_MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            password_iterations,
            trust_proxy,
        })
    }
}
