//! Layered configuration for `app-launcher serve`.
//!
//! Sources are applied file → environment → CLI, highest last:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! dev_mode = false
//!
//! [storage]
//! backend = "sqlite"            # memory | sqlite | postgres
//! sqlite_path = ".launcher/launcher.db"
//! # database_url = "postgresql://user:pass@db:5432/launcher"
//!
//! [access]
//! gated = true                  # require ACCESS_CODE on create
//! ```
//!
//! Environment variables: `DATABASE_URL`, or the discrete `POSTGRES_HOSTNAME`,
//! `POSTGRES_PASSWORD`, `POSTGRES_DB`, `POSTGRES_USER`, `POSTGRES_PORT`; and
//! `ACCESS_CODE` for the create gate.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::server::ServerConfig;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_SQLITE_PATH: &str = ".launcher/launcher.db";
pub const DEFAULT_CONFIG_FILE: &str = "launcher.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub access: AccessSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: Option<BackendKind>,
    pub sqlite_path: Option<PathBuf>,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSection {
    pub gated: bool,
}

impl Default for AccessSection {
    fn default() -> Self {
        Self { gated: true }
    }
}

impl LauncherConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse launcher.toml")
    }

    /// An explicit path must exist; the default file is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// A database connection string that must never be logged verbatim.
#[derive(Debug)]
pub struct DatabaseUrl(SecretString);

impl DatabaseUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(SecretString::from(url.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn redacted(&self) -> String {
        redact_connection_string(self.expose())
    }
}

#[derive(Debug)]
pub enum StorageBackend {
    Memory,
    Sqlite(PathBuf),
    Postgres(DatabaseUrl),
}

impl StorageBackend {
    pub fn describe(&self) -> String {
        match self {
            StorageBackend::Memory => "memory".to_string(),
            StorageBackend::Sqlite(path) => format!("sqlite:{}", path.display()),
            StorageBackend::Postgres(url) => url.redacted(),
        }
    }
}

/// Who may create entries.
#[derive(Debug)]
pub enum AccessPolicy {
    /// Anyone may create.
    Open,
    /// Creation requires `accessCode` to equal the configured secret.
    Gated { access_code: Option<SecretString> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    Allowed,
    /// Gated, but the server has no secret to compare against.
    NotConfigured,
    Denied,
}

impl AccessPolicy {
    pub fn gated(access_code: Option<String>) -> Self {
        AccessPolicy::Gated {
            access_code: access_code
                .filter(|c| !c.is_empty())
                .map(SecretString::from),
        }
    }

    pub fn check(&self, presented: Option<&str>) -> AccessCheck {
        match self {
            AccessPolicy::Open => AccessCheck::Allowed,
            AccessPolicy::Gated { access_code: None } => AccessCheck::NotConfigured,
            AccessPolicy::Gated {
                access_code: Some(expected),
            } => match presented {
                Some(code) if !code.is_empty() && code == expected.expose_secret() => {
                    AccessCheck::Allowed
                }
                _ => AccessCheck::Denied,
            },
        }
    }
}

/// CLI-level overrides for `serve`.
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dev: bool,
    pub in_memory: bool,
    pub database_url: Option<String>,
    pub db_path: Option<PathBuf>,
    pub open_creates: bool,
}

/// Strip a leading `http://`/`https://` and anything from the first `/`.
pub fn sanitize_hostname(raw: &str) -> String {
    let without_scheme = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    match without_scheme.find('/') {
        Some(idx) => without_scheme[..idx].to_string(),
        None => without_scheme.to_string(),
    }
}

/// Assemble a Postgres URL from the discrete `POSTGRES_*` variables.
///
/// Requires hostname, password and database; user defaults to `postgres`
/// and port to `5432`.
pub fn postgres_url_from_parts<F>(env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|v| !v.is_empty());
    let hostname = var("POSTGRES_HOSTNAME")?;
    let password = var("POSTGRES_PASSWORD")?;
    let database = var("POSTGRES_DB")?;
    let username = var("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string());
    let port = var("POSTGRES_PORT").unwrap_or_else(|| "5432".to_string());

    let hostname = sanitize_hostname(&hostname);
    tracing::debug!(hostname = %hostname, "Building Postgres connection string from parts");
    match assemble_postgres_url(&hostname, &port, &database, &username, &password) {
        Some(url) => Some(url.to_string()),
        None => {
            tracing::warn!(
                hostname = %hostname,
                port = %port,
                "Ignoring POSTGRES_* variables that do not form a valid URL"
            );
            None
        }
    }
}

/// Credentials and database name are percent-encoded by `url`.
fn assemble_postgres_url(
    hostname: &str,
    port: &str,
    database: &str,
    username: &str,
    password: &str,
) -> Option<url::Url> {
    let mut url = url::Url::parse(&format!("postgresql://{}", hostname)).ok()?;
    url.set_port(Some(port.parse().ok()?)).ok()?;
    url.set_path(&format!("/{}", database));
    url.set_username(username).ok()?;
    url.set_password(Some(password)).ok()?;
    Some(url)
}

/// Replace the password component with `****`.
pub fn redact_connection_string(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("****"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable connection string>".to_string(),
    }
}

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

/// Interpret a `DATABASE_URL`-style value.
pub fn backend_from_url(url: &str) -> StorageBackend {
    if is_postgres_url(url) {
        return StorageBackend::Postgres(DatabaseUrl::new(url));
    }
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    StorageBackend::Sqlite(PathBuf::from(path))
}

/// Pick the storage backend. First match wins: CLI flags, then
/// environment, then the config file, then the default SQLite file.
pub fn resolve_storage<F>(
    overrides: &ServeOverrides,
    file: &StorageSection,
    env: F,
) -> Result<StorageBackend>
where
    F: Fn(&str) -> Option<String>,
{
    if overrides.in_memory {
        return Ok(StorageBackend::Memory);
    }
    if let Some(url) = &overrides.database_url {
        return Ok(backend_from_url(url));
    }
    if let Some(path) = &overrides.db_path {
        return Ok(StorageBackend::Sqlite(path.clone()));
    }
    if let Some(url) = env("DATABASE_URL").filter(|v| !v.is_empty()) {
        return Ok(backend_from_url(&url));
    }
    if let Some(url) = postgres_url_from_parts(&env) {
        return Ok(StorageBackend::Postgres(DatabaseUrl::new(url)));
    }

    match file.backend {
        Some(BackendKind::Memory) => Ok(StorageBackend::Memory),
        Some(BackendKind::Sqlite) => Ok(StorageBackend::Sqlite(
            file.sqlite_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
        )),
        Some(BackendKind::Postgres) => match &file.database_url {
            Some(url) if is_postgres_url(url) => Ok(StorageBackend::Postgres(DatabaseUrl::new(url))),
            Some(url) => bail!(
                "storage.backend is postgres but storage.database_url is not a postgres URL: {}",
                redact_connection_string(url)
            ),
            None => bail!(
                "storage.backend is postgres but no database_url, DATABASE_URL or POSTGRES_* variables are set"
            ),
        },
        None => {
            if let Some(url) = &file.database_url {
                Ok(backend_from_url(url))
            } else {
                Ok(StorageBackend::Sqlite(
                    file.sqlite_path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
                ))
            }
        }
    }
}

/// Merge every source into the runtime server configuration.
pub fn resolve<F>(file: &LauncherConfig, overrides: &ServeOverrides, env: F) -> Result<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let storage = resolve_storage(overrides, &file.storage, &env)?;
    let access = if overrides.open_creates || !file.access.gated {
        AccessPolicy::Open
    } else {
        AccessPolicy::gated(env("ACCESS_CODE"))
    };

    Ok(ServerConfig {
        host: overrides
            .host
            .clone()
            .unwrap_or_else(|| file.server.host.clone()),
        port: overrides.port.unwrap_or(file.server.port),
        dev_mode: overrides.dev || file.server.dev_mode,
        storage,
        access,
    })
}

/// Environment lookup used outside of tests.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
