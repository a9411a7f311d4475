//! Neptune cluster adapter
//!
//! Neptune shares the RDS control plane: cluster ARNs live in the `rds`
//! namespace and DescribeDBClusters may return non-Neptune clusters, which
//! are left to their own adapter.

use super::helpers::drain_pages;
use super::AwsContext;
use crate::error::{Result, StopperError};
use crate::provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
use crate::stopper::ResourceStopper;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_neptune::operation::describe_db_clusters::DescribeDbClustersOutput;
use aws_sdk_neptune::Client as NeptuneClient;
use tracing::debug;

const KIND: ResourceKind = ResourceKind::Neptune;

pub(crate) fn neptune_cluster_is_running(status: Option<&str>, engine: Option<&str>) -> bool {
    status == Some("available") && engine == Some("neptune")
}

pub struct NeptuneStopper {
    client: NeptuneClient,
    ctx: AwsContext,
}

impl NeptuneStopper {
    pub fn new(sdk_config: &SdkConfig, ctx: AwsContext) -> Self {
        Self {
            client: NeptuneClient::new(sdk_config),
            ctx,
        }
    }
}

/// Running Neptune cluster ids on one DescribeDBClusters page, plus the next marker
pub(crate) fn running_clusters_page(
    output: &DescribeDbClustersOutput,
) -> (Vec<ResourceId>, Option<String>) {
    let mut running = Vec::new();
    for cluster in output.db_clusters() {
        let Some(id) = cluster.db_cluster_identifier() else {
            continue;
        };
        if neptune_cluster_is_running(cluster.status(), cluster.engine()) {
            running.push(id.to_string());
        } else {
            debug!(
                "Skipping cluster {} (engine {:?}, status {:?})",
                id,
                cluster.engine(),
                cluster.status()
            );
        }
    }
    (running, output.marker().map(str::to_string))
}

#[async_trait]
impl ResourceStopper for NeptuneStopper {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn list_running(&self) -> Result<Vec<ResourceId>> {
        drain_pages(|marker| async move {
            self.client
                .describe_db_clusters()
                .set_marker(marker)
                .send()
                .await
                .map(|response| running_clusters_page(&response))
                .map_err(StopperError::aws(KIND, "DescribeDBClusters"))
        })
        .await
    }

    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>> {
        let mut protected = Vec::new();
        for id in candidates {
            let response = self
                .client
                .list_tags_for_resource()
                .resource_name(self.ctx.arn().rds_cluster(id))
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
                .stop_db_cluster()
                .db_cluster_identifier(id)
                .send()
                .await
                .map_err(StopperError::aws(KIND, "StopDBCluster"))?;
            debug!("Stop requested for Neptune cluster {}", id);
        }
        Ok(())
    }
}
