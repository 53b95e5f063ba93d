use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use medidash_core::{DEFAULT_BASE_URL, PageSize, QueryOptions};
use serde::{Deserialize, Serialize};

pub const CONFIG_KEYS: &str =
    "server, format, stale_time_secs, debounce_ms, page_size, request_timeout_secs";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
    pub stale_time_secs: Option<u64>,
    pub debounce_ms: Option<u64>,
    pub page_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

impl ProfileConfig {
    /// Parses and stores `value` under `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => {
                url::Url::parse(value).with_context(|| format!("Invalid server URL: {value}"))?;
                self.server = Some(value.to_string());
            }
            "format" => {
                crate::cli::OutputFormat::parse_config(value)
                    .with_context(|| format!("Invalid format: {value}. Valid formats: json, table"))?;
                self.format = Some(value.to_lowercase());
            }
            "stale_time_secs" => self.stale_time_secs = Some(parse_number(key, value)?),
            "debounce_ms" => self.debounce_ms = Some(parse_number(key, value)?),
            "page_size" => {
                let size: usize = parse_number(key, value)?;
                PageSize::new(size)?;
                self.page_size = Some(size);
            }
            "request_timeout_secs" => self.request_timeout_secs = Some(parse_number(key, value)?),
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: {CONFIG_KEYS}"),
        }
        Ok(())
    }

    pub fn query_options(&self) -> QueryOptions {
        let options = QueryOptions::default();
        match self.stale_time_secs {
            Some(secs) => options.with_stale_time(Duration::from_secs(secs)),
            None => options,
        }
    }

    pub fn debounce(&self) -> Option<Duration> {
        self.debounce_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Stored page size, ignoring values that are no longer allowed.
    pub fn page_size(&self) -> Option<PageSize> {
        self.page_size.and_then(|size| PageSize::new(size).ok())
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {key}: {value} (expected a number)"))
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".medidash");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(cfg)
}

pub fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

pub fn resolve_server(cli_server: &Option<String>, profile: &ProfileConfig) -> String {
    // 1. --server flag / MEDIDASH_URL env
    if let Some(s) = cli_server {
        return s.clone();
    }
    // 2. config.toml profile
    if let Some(s) = &profile.server {
        return s.clone();
    }
    // 3. Public demo data source
    DEFAULT_BASE_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let all = load_all_from(&dir.path().join("config.toml")).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_profiles_round_trip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut local = ProfileConfig::default();
        local.set("server", "http://localhost:3000").unwrap();
        local.set("page_size", "25").unwrap();
        save_profile_to(&path, "local", &local).unwrap();

        let mut prod = ProfileConfig::default();
        prod.set("format", "JSON").unwrap();
        save_profile_to(&path, "prod", &prod).unwrap();

        let all = load_all_from(&path).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["local"], local);
        assert_eq!(all["prod"].format.as_deref(), Some("json"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut cfg = ProfileConfig::default();
        assert!(cfg.set("page_size", "20").is_err());
        assert!(cfg.set("debounce_ms", "soon").is_err());
        assert!(cfg.set("server", "not a url").is_err());
        assert!(cfg.set("color", "blue").is_err());
        assert_eq!(cfg, ProfileConfig::default());
    }

    #[test]
    fn test_server_resolution_order() {
        let mut cfg = ProfileConfig::default();
        assert_eq!(resolve_server(&None, &cfg), DEFAULT_BASE_URL);

        cfg.server = Some("http://profile:3000".into());
        assert_eq!(resolve_server(&None, &cfg), "http://profile:3000");
        assert_eq!(
            resolve_server(&Some("http://flag:3000".into()), &cfg),
            "http://flag:3000"
        );
    }

    #[test]
    fn test_derived_settings() {
        let cfg = ProfileConfig {
            stale_time_secs: Some(60),
            debounce_ms: Some(150),
            page_size: Some(7),
            ..Default::default()
        };
        assert_eq!(cfg.query_options().stale_time, Duration::from_secs(60));
        assert!(!cfg.query_options().refetch_on_focus);
        assert_eq!(cfg.debounce(), Some(Duration::from_millis(150)));
        assert_eq!(cfg.page_size(), None);
        assert_eq!(cfg.request_timeout(), None);
    }
}
