//! AWS adapters for the stop workflow
//!
//! One submodule per resource kind, each implementing
//! [`ResourceStopper`](crate::stopper::ResourceStopper) over the matching SDK
//! client:
//! - `ec2`: EC2 instances (batched tag lookup and batched stop)
//! - `sagemaker`: SageMaker notebook instances
//! - `rds`: RDS database instances (non-cluster engines)
//! - `aurora`: RDS Aurora clusters
//! - `neptune`: Neptune clusters
//! - `redshift`: Redshift clusters (paused, not stopped)
//! - `helpers`: ARN construction and pagination-independent helpers
//!
//! ## Client configuration
//!
//! Inside AWS the SDK picks up the execution role and region from the
//! environment. Locally (`aws.local = true` or `LOCAL_AWS=TRUE`) the loader is
//! pointed at a named credentials profile and a fixed region. Only client
//! construction differs between the two; the stopping logic is identical.

mod aurora;
mod ec2;
mod helpers;
mod neptune;
mod rds;
mod redshift;
mod sagemaker;

pub use aurora::AuroraStopper;
pub use ec2::Ec2Stopper;
pub use helpers::{redshift_cluster_id_from_arn, ResourceArn};
pub use neptune::NeptuneStopper;
pub use rds::{DbInstanceEligibility, DbInstanceSummary, RdsStopper};
pub use redshift::RedshiftStopper;
pub use sagemaker::SageMakerStopper;

use crate::config::AwsConfig;
use crate::error::{ConfigError, Result, StopperError};
use crate::provider::ResourceKind;
use crate::stopper::ResourceStopper;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, info};

/// Account and region shared by every adapter in one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsContext {
    pub account_id: String,
    pub region: String,
    pub partition: String,
}

impl AwsContext {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            partition: "aws".to_string(),
        }
    }

    /// ARN builder scoped to this account and region
    pub fn arn(&self) -> ResourceArn<'_> {
        ResourceArn::new(&self.partition, &self.region, &self.account_id)
    }
}

/// Load SDK configuration for either the execution environment or a local profile
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    if aws.local {
        info!(
            "Running locally with profile '{}' in region {}",
            aws.profile, aws.region
        );
        aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&aws.profile)
            .region(Region::new(aws.region.clone()))
            .load()
            .await
    } else {
        debug!("Using execution environment credentials and region");
        aws_config::load_defaults(BehaviorVersion::latest()).await
    }
}

/// Region the SDK resolved, required for building ARNs
pub fn resolved_region(sdk_config: &SdkConfig) -> Result<String> {
    sdk_config
        .region()
        .map(|r| r.as_ref().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ConfigError::MissingField("aws region".to_string()).into())
}

/// Resolve the caller's account ID with a single STS call
pub async fn resolve_account_id(sdk_config: &SdkConfig) -> Result<String> {
    let client = StsClient::new(sdk_config);
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| StopperError::Identity(format!("GetCallerIdentity failed: {}", e)))?;

    let account = identity
        .account()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| StopperError::Identity("caller identity has no account".to_string()))?;

    info!("Resolved account {}", account);
    Ok(account.to_string())
}

/// Resolve account and region once for the whole invocation
pub async fn resolve_context(sdk_config: &SdkConfig) -> Result<AwsContext> {
    let region = resolved_region(sdk_config)?;
    let account_id = resolve_account_id(sdk_config).await?;
    Ok(AwsContext::new(account_id, region))
}

/// Build the adapter for `kind`
pub fn build_stopper(
    kind: ResourceKind,
    sdk_config: &SdkConfig,
    ctx: &AwsContext,
) -> Box<dyn ResourceStopper> {
    match kind {
        ResourceKind::Ec2 => Box::new(Ec2Stopper::new(sdk_config)),
        ResourceKind::Sagemaker => Box::new(SageMakerStopper::new(sdk_config, ctx.clone())),
        ResourceKind::Rds => Box::new(RdsStopper::new(sdk_config, ctx.clone())),
        ResourceKind::RdsAurora => Box::new(AuroraStopper::new(sdk_config, ctx.clone())),
        ResourceKind::Neptune => Box::new(NeptuneStopper::new(sdk_config, ctx.clone())),
        ResourceKind::Redshift => Box::new(RedshiftStopper::new(sdk_config)),
    }
}
