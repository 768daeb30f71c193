use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracedeckError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub query_tcp_addr: String,
    pub uds_path: PathBuf,
    pub retention_ttl: Duration,
    pub retention_max_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let xdg_runtime = env::var("XDG_RUNTIME_DIR").ok();
        let data_home = env::var("XDG_DATA_HOME").ok();

        let data_root = data_home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".local/share"));

        let uds_path = xdg_runtime
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join("tracedeck"))
            .join("tracedeck.sock");

        Self {
            db_path: data_root.join("tracedeck/tracedeck.duckdb"),
            query_tcp_addr: "127.0.0.1:1879".to_string(),
            uds_path,
            retention_ttl: Duration::from_secs(60 * 60 * 24 * 7),
            retention_max_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    db_path: Option<PathBuf>,
    query_tcp_addr: Option<String>,
    uds_path: Option<PathBuf>,
    retention_ttl: Option<String>,
    retention_max_bytes: Option<u64>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("TRACEDECK_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("tracedeck/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| TracedeckError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| TracedeckError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let retention_max_bytes = match env::var("TRACEDECK_RETENTION_MAX_BYTES") {
        Ok(v) => Some(v.parse::<u64>().map_err(|e| {
            TracedeckError::Config(format!("bad TRACEDECK_RETENTION_MAX_BYTES: {e}"))
        })?),
        Err(_) => None,
    };

    Ok(ConfigOverrides {
        db_path: env::var("TRACEDECK_DB_PATH").ok().map(PathBuf::from),
        query_tcp_addr: env::var("TRACEDECK_QUERY_TCP_ADDR").ok(),
        uds_path: env::var("TRACEDECK_QUERY_UDS_PATH").ok().map(PathBuf::from),
        retention_ttl: env::var("TRACEDECK_RETENTION_TTL").ok(),
        retention_max_bytes,
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.db_path {
        cfg.db_path = v;
    }
    if let Some(v) = overrides.query_tcp_addr {
        cfg.query_tcp_addr = v;
    }
    if let Some(v) = overrides.uds_path {
        cfg.uds_path = v;
    }
    if let Some(v) = overrides.retention_ttl {
        cfg.retention_ttl = humantime::parse_duration(&v).map_err(|e| {
            TracedeckError::Config(format!("bad retention_ttl in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.retention_max_bytes {
        cfg.retention_max_bytes = v;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_and_retention() {
        let cfg = Config::default();
        assert_eq!(cfg.query_tcp_addr, "127.0.0.1:1879");
        assert_eq!(cfg.retention_ttl, Duration::from_secs(604_800));
        assert!(cfg.retention_max_bytes > 1024 * 1024);
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut cfg = Config::default();
        let overrides = ConfigOverrides {
            db_path: Some(PathBuf::from("/tmp/td.duckdb")),
            query_tcp_addr: Some("127.0.0.1:9999".to_string()),
            retention_ttl: Some("36h".to_string()),
            ..ConfigOverrides::default()
        };
        apply_overrides(&mut cfg, overrides, "config file").unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/td.duckdb"));
        assert_eq!(cfg.query_tcp_addr, "127.0.0.1:9999");
        assert_eq!(cfg.retention_ttl, Duration::from_secs(36 * 3600));
    }

    #[test]
    fn bad_ttl_is_a_config_error() {
        let mut cfg = Config::default();
        let overrides = ConfigOverrides {
            retention_ttl: Some("not-a-duration".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, overrides, "config file").is_err());
    }
}
