use crate::error::{ConfigError, Result};
use crate::provider::ResourceKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOCAL_CONFIG_FILE: &str = ".resource-stopper.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stopper: StopperConfig,
    #[serde(default)]
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopperConfig {
    /// Kinds to process, in order
    #[serde(default = "default_kinds")]
    pub kinds: Vec<ResourceKind>,
    /// Log what would be stopped without stopping anything
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Use a local credentials profile instead of the execution role
    #[serde(default)]
    pub local: bool,
    /// Credentials profile used when `local` is set
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Region used when `local` is set
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_kinds() -> Vec<ResourceKind> {
    ResourceKind::ALL.to_vec()
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

impl Default for StopperConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            dry_run: false,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            local: false,
            profile: default_profile(),
            region: default_region(),
        }
    }
}

impl Config {
    /// Load from `path`, `./.resource-stopper.toml`, or the user config dir
    ///
    /// Falls back to defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            let local = PathBuf::from(LOCAL_CONFIG_FILE);
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("resource-stopper").join("config.toml"))
                    .unwrap_or(local)
            }
        };

        if !config_path.exists() {
            if path.is_some() {
                tracing::warn!(
                    "Config file not found: {}. Using default configuration.",
                    config_path.display()
                );
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stopper.kinds.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "stopper.kinds".to_string(),
                reason: "at least one resource kind is required".to_string(),
            }
            .into());
        }
        if self.aws.local {
            if self.aws.profile.trim().is_empty() {
                return Err(ConfigError::MissingField("aws.profile".to_string()).into());
            }
            if self.aws.region.trim().is_empty() {
                return Err(ConfigError::MissingField("aws.region".to_string()).into());
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Parse a comma-separated kind list, e.g. `ec2,rds-aurora`
pub fn parse_kind_list(raw: &str) -> Result<Vec<ResourceKind>> {
    let kinds = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<std::result::Result<Vec<ResourceKind>, ConfigError>>()?;
    if kinds.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "kinds".to_string(),
            reason: "at least one resource kind is required".to_string(),
        }
        .into());
    }
    Ok(kinds)
}

pub fn init_config(output: &Path) -> Result<()> {
    Config::default().save(output)?;
    tracing::info!("Created config file: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StopperError;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.stopper.kinds, ResourceKind::ALL.to_vec());
        assert!(!config.stopper.dry_run);
        assert!(!config.aws.local);
        assert_eq!(config.aws.region, "us-west-2");
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = Config::default();
        config.stopper.kinds = vec![ResourceKind::Redshift, ResourceKind::Ec2];
        config.stopper.dry_run = true;
        config.save(&config_path).unwrap();

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(loaded.stopper.kinds, config.stopper.kinds);
        assert!(loaded.stopper.dry_run);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let fake_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load(Some(&fake_path)).unwrap();
        assert_eq!(config.stopper.kinds.len(), 6);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        std::fs::write(&config_path, "[aws]\nlocal = true\nprofile = \"sandbox\"\n").unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert!(config.aws.local);
        assert_eq!(config.aws.profile, "sandbox");
        assert_eq!(config.aws.region, "us-west-2");
        assert_eq!(config.stopper.kinds, ResourceKind::ALL.to_vec());
    }

    #[test]
    fn test_unknown_kind_in_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad_kind.toml");
        std::fs::write(&config_path, "[stopper]\nkinds = [\"ec2\", \"lambda\"]\n").unwrap();

        let err = Config::load(Some(&config_path)).unwrap_err();
        assert!(matches!(err, StopperError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_empty_kind_list_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("empty.toml");
        std::fs::write(&config_path, "[stopper]\nkinds = []\n").unwrap();

        let err = Config::load(Some(&config_path)).unwrap_err();
        assert!(matches!(err, StopperError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid toml content {").unwrap();

        assert!(Config::load(Some(&config_path)).is_err());
    }

    #[test]
    fn test_parse_kind_list() {
        assert_eq!(
            parse_kind_list("ec2, neptune").unwrap(),
            vec![ResourceKind::Ec2, ResourceKind::Neptune]
        );
        assert!(matches!(
            parse_kind_list("ec2,ecs").unwrap_err(),
            StopperError::Config(ConfigError::UnsupportedKind(ref k)) if k == "ecs"
        ));
        assert!(parse_kind_list(" , ").is_err());
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("init_test.toml");

        init_config(&config_path).unwrap();
        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.stopper.kinds, ResourceKind::ALL.to_vec());
    }
}
