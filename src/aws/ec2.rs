//! EC2 instance adapter
//!
//! Running instances are stopped in one StopInstances call. Tag protection is
//! checked with a single filtered DescribeTags query rather than per instance.

use super::helpers::drain_pages;
use crate::error::{Result, StopperError};
use crate::provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
use crate::stopper::ResourceStopper;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;
use aws_sdk_ec2::operation::describe_tags::DescribeTagsOutput;
use aws_sdk_ec2::types::{Filter, Instance, InstanceStateName};
use aws_sdk_ec2::Client as Ec2Client;
use std::future::Future;
use tracing::debug;

/// EC2 rejects filters with more than 200 values
const MAX_FILTER_VALUES: usize = 200;

const KIND: ResourceKind = ResourceKind::Ec2;

pub struct Ec2Stopper {
    client: Ec2Client,
}

impl Ec2Stopper {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Ec2Client::new(sdk_config),
        }
    }
}

/// Instance ID if the instance is in the `running` state
pub(crate) fn running_instance_id(instance: &Instance) -> Option<&str> {
    let running = matches!(
        instance.state().and_then(|s| s.name()),
        Some(InstanceStateName::Running)
    );
    if running {
        instance.instance_id()
    } else {
        None
    }
}

fn keep_running_filters(ids: &[ResourceId]) -> Vec<Filter> {
    vec![
        Filter::builder()
            .name("resource-id")
            .set_values(Some(ids.to_vec()))
            .build(),
        Filter::builder()
            .name("resource-type")
            .values("instance")
            .build(),
        Filter::builder()
            .name(format!("tag:{}", KEEP_RUNNING_TAG.key))
            .values(KEEP_RUNNING_TAG.value)
            .build(),
    ]
}

/// Running instance IDs on one DescribeInstances page, plus the next token
pub(crate) fn running_instances_page(
    output: &DescribeInstancesOutput,
) -> (Vec<ResourceId>, Option<String>) {
    let mut running = Vec::new();
    for instance in output.reservations().iter().flat_map(|r| r.instances()) {
        match running_instance_id(instance) {
            Some(id) => running.push(id.to_string()),
            None => debug!(
                "Skipping instance {:?} in state {:?}",
                instance.instance_id(),
                instance.state().and_then(|s| s.name())
            ),
        }
    }
    (running, output.next_token().map(str::to_string))
}

/// Instance IDs carrying the keep-running tag on one DescribeTags page
pub(crate) fn keep_running_tags_page(
    output: &DescribeTagsOutput,
) -> (Vec<ResourceId>, Option<String>) {
    let tagged = output
        .tags()
        .iter()
        .filter(|t| KEEP_RUNNING_TAG.matches(t.key(), t.value()))
        .filter_map(|t| t.resource_id())
        .map(str::to_string)
        .collect();
    (tagged, output.next_token().map(str::to_string))
}

/// Run a paginated tag query per chunk of at most [`MAX_FILTER_VALUES`] ids
pub(crate) async fn protected_in_chunks<F, Fut>(
    candidates: &[ResourceId],
    mut fetch: F,
) -> Result<Vec<ResourceId>>
where
    F: FnMut(Vec<ResourceId>, Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<ResourceId>, Option<String>)>>,
{
    let mut protected = Vec::new();
    for chunk in candidates.chunks(MAX_FILTER_VALUES) {
        protected.extend(drain_pages(|token| fetch(chunk.to_vec(), token)).await?);
    }
    Ok(protected)
}

#[async_trait]
impl ResourceStopper for Ec2Stopper {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn list_running(&self) -> Result<Vec<ResourceId>> {
        drain_pages(|token| async move {
            self.client
                .describe_instances()
                .set_next_token(token)
                .send()
                .await
                .map(|response| running_instances_page(&response))
                .map_err(StopperError::aws(KIND, "DescribeInstances"))
        })
        .await
    }

    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>> {
        protected_in_chunks(candidates, |chunk, token| async move {
            self.client
                .describe_tags()
                .set_filters(Some(keep_running_filters(&chunk)))
                .set_next_token(token)
                .send()
                .await
                .map(|response| keep_running_tags_page(&response))
                .map_err(StopperError::aws(KIND, "DescribeTags"))
        })
        .await
    }

    async fn stop(&self, ids: &[ResourceId]) -> Result<()> {
        self.client
            .stop_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(StopperError::aws(KIND, "StopInstances"))?;
        Ok(())
    }
}
