use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileStoreKind {
    Ftp,
    Memory,
}

#[derive(Clone, Debug)]
pub struct FtpConfig {
    /// `host:port`, port 21 when none is given.
    pub host: String,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
    pub retries: u32,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_key: String,
    pub issuer: String,
    pub audience: String,
    /// Static bearer token for registration and the legacy sync.
    pub shared_token: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub auth: AuthConfig,
    pub file_store: FileStoreKind,
    pub ftp: Option<FtpConfig>,
    pub legacy_ftp: Option<FtpConfig>,
    pub bundle_skip_failed: bool,
    pub upload_size_limit: usize,
}

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";
const DEFAULT_FTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FTP_RETRIES: u32 = 2;
const DEFAULT_UPLOAD_SIZE_LIMIT: usize = 20 * 1024 * 1024;

impl AppConfig {
    /// Reads the process environment after loading `.env`, if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let file_store = match get("FILE_STORE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("ftp") => FileStoreKind::Ftp,
            Some("memory") => FileStoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "FILE_STORE",
                    value: other.to_string(),
                })
            }
        };

        let timeout = Duration::from_secs(parse(&get, "FTP_TIMEOUT_SECS", DEFAULT_FTP_TIMEOUT_SECS)?);
        let retries = parse(&get, "FTP_RETRIES", DEFAULT_FTP_RETRIES)?;

        let ftp = match file_store {
            FileStoreKind::Ftp => Some(FtpConfig {
                host: with_default_port(&required("FTP_HOST")?),
                user: required("FTP_USER")?,
                password: required("FTP_PASSWORD")?,
                timeout,
                retries,
            }),
            FileStoreKind::Memory => None,
        };

        let legacy_ftp = match get("FTP_OX_HOST") {
            Some(host) => Some(FtpConfig {
                host: with_default_port(&host),
                user: required("FTP_OX_USER")?,
                password: required("FTP_OX_PASSWORD")?,
                timeout,
                retries,
            }),
            None => None,
        };

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            auth: AuthConfig {
                jwt_key: required("JWT_KEY")?,
                issuer: required("JWT_ISSUER")?,
                audience: required("JWT_AUDIENCE")?,
                shared_token: required("AUTH_TOKEN")?,
            },
            file_store,
            ftp,
            legacy_ftp,
            bundle_skip_failed: parse(&get, "BUNDLE_SKIP_FAILED", true)?,
            upload_size_limit: parse(&get, "UPLOAD_SIZE_LIMIT", DEFAULT_UPLOAD_SIZE_LIMIT)?,
        })
    }
}

fn parse<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&'static str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn with_default_port(host: &str) -> String {
    let host = host.trim().trim_start_matches("ftp://").trim_end_matches('/');
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:21")
    }
}
