//! RDS database instance adapter
//!
//! Covers standalone instances only. Instances that belong to a DB cluster
//! (Aurora, Neptune, DocumentDB members) are skipped here and stopped through
//! their cluster adapter.
//!
//! RDS refuses to stop some otherwise available instances, so eligibility is
//! more than a status check:
//! - a replication source (has read replicas) cannot be stopped
//! - a read replica cannot be stopped
//! - a multi-AZ SQL Server instance cannot be stopped

use super::helpers::drain_pages;
use super::AwsContext;
use crate::error::{Result, StopperError};
use crate::provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
use crate::stopper::ResourceStopper;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::operation::describe_db_instances::DescribeDbInstancesOutput;
use aws_sdk_rds::types::DbInstance;
use aws_sdk_rds::Client as RdsClient;
use std::fmt;
use tracing::{debug, info};

const KIND: ResourceKind = ResourceKind::Rds;

const AVAILABLE: &str = "available";
const SQLSERVER_ENGINE_PREFIX: &str = "sqlserver-";

/// Fields of a DB instance that decide whether it may be stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbInstanceSummary {
    pub id: String,
    pub status: Option<String>,
    pub engine: Option<String>,
    pub multi_az: bool,
    pub read_replica_count: usize,
    pub replica_source: Option<String>,
    pub cluster_id: Option<String>,
}

impl DbInstanceSummary {
    fn from_sdk(instance: &DbInstance) -> Option<Self> {
        let id = instance.db_instance_identifier()?;
        Some(Self {
            id: id.to_string(),
            status: instance.db_instance_status().map(str::to_string),
            engine: instance.engine().map(str::to_string),
            multi_az: instance.multi_az().unwrap_or(false),
            read_replica_count: instance.read_replica_db_instance_identifiers().len(),
            replica_source: instance
                .read_replica_source_db_instance_identifier()
                .map(str::to_string),
            cluster_id: instance.db_cluster_identifier().map(str::to_string),
        })
    }

    /// Apply the status check and RDS stop restrictions, in that order
    pub fn eligibility(&self) -> DbInstanceEligibility {
        if self.status.as_deref() != Some(AVAILABLE) {
            return DbInstanceEligibility::NotRunning;
        }
        if self.cluster_id.is_some() {
            return DbInstanceEligibility::ClusterMember;
        }
        if self.read_replica_count > 0 {
            return DbInstanceEligibility::ReplicationSource;
        }
        if self.replica_source.is_some() {
            return DbInstanceEligibility::ReadReplica;
        }
        let sqlserver = self
            .engine
            .as_deref()
            .is_some_and(|e| e.starts_with(SQLSERVER_ENGINE_PREFIX));
        if self.multi_az && sqlserver {
            return DbInstanceEligibility::MultiAzSqlServer;
        }
        DbInstanceEligibility::Eligible
    }
}

/// Why a DB instance is or is not a stop candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbInstanceEligibility {
    Eligible,
    NotRunning,
    ClusterMember,
    ReplicationSource,
    ReadReplica,
    MultiAzSqlServer,
}

impl fmt::Display for DbInstanceEligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DbInstanceEligibility::Eligible => "eligible to stop",
            DbInstanceEligibility::NotRunning => "not available",
            DbInstanceEligibility::ClusterMember => {
                "it belongs to a DB cluster and is stopped with its cluster"
            }
            DbInstanceEligibility::ReplicationSource => {
                "it is the source for one or more read replicas"
            }
            DbInstanceEligibility::ReadReplica => "it is a read replica",
            DbInstanceEligibility::MultiAzSqlServer => {
                "stopping is not supported for multi-AZ Microsoft SQL Server databases"
            }
        };
        f.write_str(reason)
    }
}

pub struct RdsStopper {
    client: RdsClient,
    ctx: AwsContext,
}

impl RdsStopper {
    pub fn new(sdk_config: &SdkConfig, ctx: AwsContext) -> Self {
        Self {
            client: RdsClient::new(sdk_config),
            ctx,
        }
    }
}

/// Keep the eligible instances, logging why the others were left alone
pub(crate) fn select_candidates(instances: &[DbInstanceSummary]) -> Vec<ResourceId> {
    let mut candidates = Vec::new();
    for instance in instances {
        match instance.eligibility() {
            DbInstanceEligibility::Eligible => candidates.push(instance.id.clone()),
            DbInstanceEligibility::NotRunning => {
                debug!("Skipping {} in status {:?}", instance.id, instance.status)
            }
            reason => info!(
                "{} is running and available, but cannot be stopped because {}.",
                instance.id, reason
            ),
        }
    }
    candidates
}

/// Instance summaries on one DescribeDBInstances page, plus the next marker
pub(crate) fn db_instances_page(
    output: &DescribeDbInstancesOutput,
) -> (Vec<DbInstanceSummary>, Option<String>) {
    let instances = output
        .db_instances()
        .iter()
        .filter_map(DbInstanceSummary::from_sdk)
        .collect();
    (instances, output.marker().map(str::to_string))
}

#[async_trait]
impl ResourceStopper for RdsStopper {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn list_running(&self) -> Result<Vec<ResourceId>> {
        let instances = drain_pages(|marker| async move {
            self.client
                .describe_db_instances()
                .set_marker(marker)
                .send()
                .await
                .map(|response| db_instances_page(&response))
                .map_err(StopperError::aws(KIND, "DescribeDBInstances"))
        })
        .await?;

        Ok(select_candidates(&instances))
    }

    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>> {
        let mut protected = Vec::new();
        for id in candidates {
            let response = self
                .client
                .list_tags_for_resource()
                .resource_name(self.ctx.arn().rds_db(id))
                .send()
                .await
                .map_err(StopperError::aws(KIND, "ListTagsForResource"))?;

            if response
                .tag_list()
                .iter()
                .any(|t| KEEP_RUNNING_TAG.matches(t.key(), t.value()))
            {
                protected.push(id.clone());
            }
        }
        Ok(protected)
    }

    async fn stop(&self, ids: &[ResourceId]) -> Result<()> {
        for id in ids {
            self.client
                .stop_db_instance()
                .db_instance_identifier(id)
                .send()
                .await
                .map_err(StopperError::aws(KIND, "StopDBInstance"))?;
            debug!("Stop requested for DB instance {}", id);
        }
        Ok(())
    }
}
