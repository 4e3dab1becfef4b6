//! Service configuration.
//!
//! Settings come from an optional TOML file (`.devcost.toml` in the working
//! directory, else `~/.config/devcost/config.toml`) with environment-variable
//! overrides on top. AWS credentials themselves are resolved by the SDK:
//! static credentials from `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` take
//! precedence; without them the named shared-config profile is used.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Shared-config profile used when no static credentials are in the
/// environment.
const DEFAULT_PROFILE: &str = "devcost-api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub aws: AwsSettings,
    pub server: ServerSettings,
    pub cache: Option<CacheSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsSettings {
    /// Region override; falls back to `AWS_REGION` / profile region.
    pub region: Option<String>,
    /// Shared-config profile used when env credentials are absent.
    pub profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379`.
    pub redis_url: String,
    /// Cached-entry lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsSettings {
                region: None,
                profile: DEFAULT_PROFILE.to_string(),
            },
            server: ServerSettings {
                bind: "0.0.0.0".to_string(),
                port: 8080,
            },
            cache: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, the conventional locations, or
    /// defaults, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            let local = PathBuf::from(".devcost.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("devcost").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".devcost.toml"))
            }
        };

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                ConfigError::ReadError(format!("{}: {}", config_path.display(), e))
            })?;
            toml::from_str(&content).map_err(|e| {
                ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
            })?
        } else {
            Config::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment overrides: `AWS_REGION`, `AWS_PROFILE`, `DEVCOST_REDIS_URL`.
    fn apply_env(&mut self) {
        if let Ok(region) = std::env::var("AWS_REGION") {
            if !region.is_empty() {
                self.aws.region = Some(region);
            }
        }
        if let Ok(profile) = std::env::var("AWS_PROFILE") {
            if !profile.is_empty() {
                self.aws.profile = profile;
            }
        }
        if let Ok(url) = std::env::var("DEVCOST_REDIS_URL") {
            if !url.is_empty() {
                let ttl = self.cache.as_ref().map(|c| c.ttl_secs).unwrap_or(900);
                self.cache = Some(CacheSettings {
                    redis_url: url,
                    ttl_secs: ttl,
                });
            }
        }
    }

    /// Resolve the AWS SDK configuration. Static env credentials win; without
    /// them the configured shared-config profile is used. All service clients
    /// are built once from the returned config and reused for every request.
    pub async fn aws_sdk_config(&self) -> SdkConfig {
        let env_credentials = std::env::var("AWS_ACCESS_KEY_ID").is_ok()
            && std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.aws.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if !env_credentials {
            tracing::debug!(profile = %self.aws.profile, "no static credentials in env, using shared-config profile");
            loader = loader.profile_name(&self.aws.profile);
        }
        loader.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.aws.profile, "devcost-api");
        assert_eq!(config.server.port, 8080);
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_config_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[aws]
region = "eu-west-1"
profile = "billing"

[server]
bind = "127.0.0.1"
port = 9090

[cache]
redis_url = "redis://127.0.0.1:6379"
ttl_secs = 300
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.cache.as_ref().unwrap().ttl_secs, 300);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let fake_path = temp_dir.path().join("missing.toml");
        let config = Config::load(Some(&fake_path)).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid toml content {").unwrap();
        assert!(Config::load(Some(&config_path)).is_err());
    }
}
