//! Redshift cluster adapter
//!
//! Redshift clusters are paused rather than stopped. Tag protection uses one
//! DescribeTags query filtered on the keep-running key and value.
//!
//! Redshift has no `running` cluster status; a cluster serving queries
//! reports `available`.

use super::helpers::{drain_pages, redshift_cluster_id_from_arn};
use crate::error::{Result, StopperError};
use crate::provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
use crate::stopper::ResourceStopper;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_redshift::operation::describe_clusters::DescribeClustersOutput;
use aws_sdk_redshift::operation::describe_tags::DescribeTagsOutput;
use aws_sdk_redshift::Client as RedshiftClient;
use std::collections::HashSet;
use tracing::debug;

const KIND: ResourceKind = ResourceKind::Redshift;

pub(crate) fn redshift_cluster_is_running(status: Option<&str>) -> bool {
    status == Some("available")
}

pub struct RedshiftStopper {
    client: RedshiftClient,
}

impl RedshiftStopper {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: RedshiftClient::new(sdk_config),
        }
    }
}

/// Available cluster ids on one DescribeClusters page, plus the next marker
pub(crate) fn running_clusters_page(
    output: &DescribeClustersOutput,
) -> (Vec<ResourceId>, Option<String>) {
    let mut running = Vec::new();
    for cluster in output.clusters() {
        let Some(id) = cluster.cluster_identifier() else {
            continue;
        };
        if redshift_cluster_is_running(cluster.cluster_status()) {
            running.push(id.to_string());
        } else {
            debug!(
                "Skipping cluster {} in status {:?}",
                id,
                cluster.cluster_status()
            );
        }
    }
    (running, output.marker().map(str::to_string))
}

/// Cluster ids of the tagged resources on one DescribeTags page, plus the next marker
pub(crate) fn tagged_clusters_page(
    output: &DescribeTagsOutput,
) -> (Vec<ResourceId>, Option<String>) {
    let tagged = output
        .tagged_resources()
        .iter()
        .filter_map(|r| r.resource_name())
        .map(|name| redshift_cluster_id_from_arn(name).to_string())
        .collect();
    (tagged, output.marker().map(str::to_string))
}

/// Candidates that appear among the account-wide tagged cluster ids
pub(crate) fn protected_candidates(
    candidates: &[ResourceId],
    tagged: &[ResourceId],
) -> Vec<ResourceId> {
    let tagged: HashSet<&str> = tagged.iter().map(String::as_str).collect();
    candidates
        .iter()
        .filter(|id| tagged.contains(id.as_str()))
        .cloned()
        .collect()
}

#[async_trait]
impl ResourceStopper for RedshiftStopper {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn list_running(&self) -> Result<Vec<ResourceId>> {
        drain_pages(|marker| async move {
            self.client
                .describe_clusters()
                .set_marker(marker)
                .send()
                .await
                .map(|response| running_clusters_page(&response))
                .map_err(StopperError::aws(KIND, "DescribeClusters"))
        })
        .await
    }

    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>> {
        let tagged = drain_pages(|marker| async move {
            self.client
                .describe_tags()
                .resource_type("Cluster")
                .tag_keys(KEEP_RUNNING_TAG.key)
                .tag_values(KEEP_RUNNING_TAG.value)
                .set_marker(marker)
                .send()
                .await
                .map(|response| tagged_clusters_page(&response))
                .map_err(StopperError::aws(KIND, "DescribeTags"))
        })
        .await?;

        Ok(protected_candidates(candidates, &tagged))
    }

    async fn stop(&self, ids: &[ResourceId]) -> Result<()> {
        for id in ids {
            self.client
                .pause_cluster()
                .cluster_identifier(id)
                .send()
                .await
                .map_err(StopperError::aws(KIND, "PauseCluster"))?;
            debug!("Pause requested for Redshift cluster {}", id);
        }
        Ok(())
    }
}
