// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The controller's TOML config document and the translation from its
//! plain-data shape into the typed configs each subsystem crate expects.

use sd_core::{Credential, Target, TransportKind};
use sd_orchestrator::{OrchestratorConfig, ProbeSpec};
use sd_scheduler::{RetryPolicy, SchedulerConfig};
use sd_storage::{DatabaseConfig, SslMode};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read probe script {path}: {source}")]
    ProbeScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn default_concurrency() -> usize {
    10
}
fn default_batch_size() -> usize {
    20
}
fn default_timeout_secs() -> u64 {
    600
}
fn default_cache_ttl_minutes() -> i64 {
    30
}
fn default_false() -> bool {
    false
}
fn default_cpu_threshold() -> f32 {
    80.0
}
fn default_memory_threshold() -> f32 {
    80.0
}
fn default_api_port() -> u16 {
    8080
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_api_timeout_secs() -> u64 {
    30
}
fn default_shutdown_timeout_secs() -> u64 {
    10
}
fn default_db_port() -> u16 {
    5432
}
fn default_sslmode() -> String {
    "prefer".to_string()
}
fn default_max_db_connections() -> u32 {
    10
}
fn default_pool_capacity() -> usize {
    50
}
fn default_pool_idle_timeout_secs() -> u64 {
    300
}
fn default_governor_check_interval_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct RawConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl: i64,
    pub output_dir: PathBuf,
    pub powershell_script: PathBuf,
    pub shell_script: PathBuf,
    #[serde(default = "default_false")]
    pub skip_cert_verify: bool,
    #[serde(default)]
    pub resource_thresholds: RawThresholds,
    #[serde(default)]
    pub api: RawApiConfig,
    pub database: RawDatabaseConfig,
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default)]
    pub servers: Vec<RawServer>,
}

#[derive(Debug, Deserialize)]
pub struct RawThresholds {
    #[serde(default = "default_cpu_threshold")]
    pub cpu: f32,
    #[serde(default = "default_memory_threshold")]
    pub memory: f32,
    #[serde(default = "default_governor_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for RawThresholds {
    fn default() -> Self {
        Self {
            cpu: default_cpu_threshold(),
            memory: default_memory_threshold(),
            check_interval_secs: default_governor_check_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_api_timeout_secs")]
    pub read_timeout: u64,
    #[serde(default = "default_api_timeout_secs")]
    pub write_timeout: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout: u64,
}

impl Default for RawApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            allowed_origins: default_allowed_origins(),
            read_timeout: default_api_timeout_secs(),
            write_timeout: default_api_timeout_secs(),
            shutdown_timeout: default_shutdown_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawDatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    #[serde(default = "default_false")]
    pub enabled: bool,
    #[serde(default = "default_max_db_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawServer {
    pub id: String,
    pub hostname: String,
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub use_https: bool,
    pub region: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Explicit transport override; falls back to `ssh` for port 22 and
    /// `winrm` for everything else when omitted.
    #[serde(default)]
    pub transport: Option<String>,
}

/// Fully resolved configuration, after reading the probe scripts off disk
/// and translating every table into its consuming crate's config type.
pub struct Config {
    pub targets: Vec<Target>,
    pub scheduler: SchedulerConfig,
    pub orchestrator: OrchestratorConfig,
    pub cache_ttl_minutes: i64,
    pub resource_thresholds: sd_governor::Thresholds,
    pub governor_check_interval: Duration,
    pub pool_capacity: usize,
    pub pool_idle_timeout: Duration,
    pub skip_cert_verify: bool,
    pub api: sd_api::ApiConfig,
    pub database: DatabaseConfig,
    pub database_enabled: bool,
}

/// Resolves a server's transport kind: an explicit `transport = "ssh"` /
/// `"winrm"` always wins; absent that, SSH is inferred from a key file or
/// the conventional port 22, and WinRM otherwise.
fn resolve_transport(server: &RawServer) -> TransportKind {
    if let Some(explicit) = server.transport.as_deref() {
        return match explicit.to_ascii_lowercase().as_str() {
            "ssh" => TransportKind::Ssh,
            "winrm" => TransportKind::Winrm,
            _ => TransportKind::Winrm,
        };
    }
    if server.key_path.is_some() || server.port == TransportKind::Ssh.default_port() {
        TransportKind::Ssh
    } else {
        TransportKind::Winrm
    }
}

fn parse_sslmode(raw: &str) -> SslMode {
    match raw.to_ascii_lowercase().as_str() {
        "disable" => SslMode::Disable,
        "require" => SslMode::Require,
        _ => SslMode::Prefer,
    }
}

fn database_config(raw: &RawDatabaseConfig) -> DatabaseConfig {
    DatabaseConfig {
        host: raw.host.clone(),
        port: raw.port,
        user: raw.user.clone(),
        password: raw.password.clone(),
        dbname: raw.dbname.clone(),
        sslmode: parse_sslmode(&raw.sslmode),
        max_connections: raw.max_connections,
    }
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw_text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&raw_text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw)
    }

    /// Reads just the `[database]` table, for `sdisc`'s read-only client —
    /// it never needs the probe scripts or server catalog `Config::load`
    /// requires. Returns the database config plus whether the store is
    /// enabled.
    pub fn load_database_only(path: &std::path::Path) -> Result<(DatabaseConfig, bool), ConfigError> {
        #[derive(Deserialize)]
        struct DatabaseOnly {
            database: RawDatabaseConfig,
        }

        let raw_text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: DatabaseOnly = toml::from_str(&raw_text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((database_config(&parsed.database), parsed.database.enabled))
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let linux_script =
            std::fs::read(&raw.shell_script).map_err(|source| ConfigError::ProbeScript {
                path: raw.shell_script.clone(),
                source,
            })?;
        let windows_script =
            std::fs::read(&raw.powershell_script).map_err(|source| ConfigError::ProbeScript {
                path: raw.powershell_script.clone(),
                source,
            })?;

        let targets = raw
            .servers
            .iter()
            .map(|server| {
                let transport = resolve_transport(server);
                let mut target = Target::new(
                    server.id.clone(),
                    server.hostname.clone(),
                    transport,
                    server.port,
                    Credential {
                        username: server.username.clone(),
                        password: server.password.clone(),
                        key_path: server.key_path.clone(),
                    },
                    server.region.clone(),
                )
                .with_tags(server.tags.clone());
                target.use_https = server.use_https;
                target.skip_cert_verify = raw.skip_cert_verify;
                target
            })
            .collect();

        Ok(Self {
            targets,
            scheduler: SchedulerConfig {
                concurrency: raw.concurrency,
                batch_size: raw.batch_size,
                retry: RetryPolicy::default(),
                progress_interval: Duration::from_secs(10),
            },
            orchestrator: OrchestratorConfig {
                remote_base_dir: "/tmp".to_string(),
                out_dir: raw.output_dir,
                probe_timeout: Duration::from_secs(raw.timeout),
                probe: ProbeSpec {
                    linux_script,
                    windows_script,
                },
            },
            cache_ttl_minutes: raw.cache_ttl,
            resource_thresholds: sd_governor::Thresholds {
                cpu_percent: raw.resource_thresholds.cpu,
                memory_percent: raw.resource_thresholds.memory,
            },
            governor_check_interval: Duration::from_secs(raw.resource_thresholds.check_interval_secs),
            pool_capacity: raw.pool_capacity,
            pool_idle_timeout: Duration::from_secs(raw.pool_idle_timeout_secs),
            skip_cert_verify: raw.skip_cert_verify,
            api: sd_api::ApiConfig {
                port: raw.api.port,
                allowed_origins: raw.api.allowed_origins,
                read_timeout: Duration::from_secs(raw.api.read_timeout),
                write_timeout: Duration::from_secs(raw.api.write_timeout),
                shutdown_timeout: Duration::from_secs(raw.api.shutdown_timeout),
            },
            database: database_config(&raw.database),
            database_enabled: raw.database.enabled,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
