//! Provider-agnostic resource types
//!
//! Identifiers, the closed set of resource kinds the stopper knows how to
//! handle, and the keep-running tag policy. Nothing in here talks to AWS.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource identifier (instance ID, cluster identifier, notebook name)
pub type ResourceId = String;

/// Tag that exempts a resource from being stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepRunningTag {
    pub key: &'static str,
    pub value: &'static str,
}

/// Process-wide keep-running policy: `KeepRunning=true`
pub const KEEP_RUNNING_TAG: KeepRunningTag = KeepRunningTag {
    key: "KeepRunning",
    value: "true",
};

impl KeepRunningTag {
    /// Exact, case-sensitive match on both key and value
    pub fn matches(&self, key: Option<&str>, value: Option<&str>) -> bool {
        key == Some(self.key) && value == Some(self.value)
    }
}

impl fmt::Display for KeepRunningTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Resource kinds that can be stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Ec2,
    Sagemaker,
    Rds,
    RdsAurora,
    Neptune,
    Redshift,
}

impl ResourceKind {
    /// Every kind, in the default processing order
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Ec2,
        ResourceKind::Sagemaker,
        ResourceKind::Rds,
        ResourceKind::RdsAurora,
        ResourceKind::Neptune,
        ResourceKind::Redshift,
    ];

    /// Name used in config files and on the command line
    pub fn config_name(&self) -> &'static str {
        match self {
            ResourceKind::Ec2 => "ec2",
            ResourceKind::Sagemaker => "sagemaker",
            ResourceKind::Rds => "rds",
            ResourceKind::RdsAurora => "rds-aurora",
            ResourceKind::Neptune => "neptune",
            ResourceKind::Redshift => "redshift",
        }
    }

    /// Human-readable label, only used for logging
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Ec2 => "EC2 instance",
            ResourceKind::Sagemaker => "SageMaker notebook",
            ResourceKind::Rds => "RDS database",
            ResourceKind::RdsAurora => "RDS Aurora cluster",
            ResourceKind::Neptune => "Neptune cluster",
            ResourceKind::Redshift => "Redshift cluster",
        }
    }

    /// Plural label, e.g. "EC2 instances"
    pub fn plural_label(&self) -> String {
        format!("{}s", self.label())
    }

    /// Label pluralized for `count` resources
    pub fn label_for(&self, count: usize) -> String {
        if count == 1 {
            self.label().to_string()
        } else {
            self.plural_label()
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.config_name() == wanted)
            .ok_or_else(|| ConfigError::UnsupportedKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_running_tag_matches_exactly() {
        assert!(KEEP_RUNNING_TAG.matches(Some("KeepRunning"), Some("true")));
        assert!(!KEEP_RUNNING_TAG.matches(Some("KeepRunning"), Some("True")));
        assert!(!KEEP_RUNNING_TAG.matches(Some("keeprunning"), Some("true")));
        assert!(!KEEP_RUNNING_TAG.matches(Some("KeepRunning"), None));
        assert!(!KEEP_RUNNING_TAG.matches(None, Some("true")));
    }

    #[test]
    fn test_kind_parse_round_trips_config_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.config_name().parse::<ResourceKind>().unwrap(), kind);
        }
        assert_eq!(" EC2 ".parse::<ResourceKind>().unwrap(), ResourceKind::Ec2);
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let err = "dynamodb".parse::<ResourceKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedKind(ref k) if k == "dynamodb"));
    }

    #[test]
    fn test_label_pluralization() {
        assert_eq!(ResourceKind::Ec2.label_for(1), "EC2 instance");
        assert_eq!(ResourceKind::Ec2.label_for(3), "EC2 instances");
        assert_eq!(ResourceKind::Redshift.label_for(0), "Redshift clusters");
        assert_eq!(ResourceKind::Rds.plural_label(), "RDS databases");
        assert_eq!(ResourceKind::Sagemaker.plural_label(), "SageMaker notebooks");
    }

    #[test]
    fn test_kind_serde_uses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            kinds: Vec<ResourceKind>,
        }
        let parsed: Wrapper = toml::from_str(r#"kinds = ["rds-aurora", "ec2"]"#).unwrap();
        assert_eq!(parsed.kinds, vec![ResourceKind::RdsAurora, ResourceKind::Ec2]);
    }
}
