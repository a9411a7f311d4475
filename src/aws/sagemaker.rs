//! SageMaker notebook instance adapter

use super::helpers::drain_pages;
use super::AwsContext;
use crate::error::{Result, StopperError};
use crate::provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
use crate::stopper::ResourceStopper;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sagemaker::operation::list_notebook_instances::ListNotebookInstancesOutput;
use aws_sdk_sagemaker::types::NotebookInstanceStatus;
use aws_sdk_sagemaker::Client as SageMakerClient;
use tracing::debug;

const KIND: ResourceKind = ResourceKind::Sagemaker;

pub struct SageMakerStopper {
    client: SageMakerClient,
    ctx: AwsContext,
}

impl SageMakerStopper {
    pub fn new(sdk_config: &SdkConfig, ctx: AwsContext) -> Self {
        Self {
            client: SageMakerClient::new(sdk_config),
            ctx,
        }
    }

    async fn is_tagged_to_keep_running(&self, name: &str) -> Result<bool> {
        let arn = self.ctx.arn().sagemaker_notebook(name);
        let tags = drain_pages(|token| {
            let arn = arn.clone();
            async move {
                self.client
                    .list_tags()
                    .resource_arn(arn)
                    .set_next_token(token)
                    .send()
                    .await
                    .map(|response| {
                        (
                            response.tags().to_vec(),
                            response.next_token().map(str::to_string),
                        )
                    })
                    .map_err(StopperError::aws(KIND, "ListTags"))
            }
        })
        .await?;

        Ok(has_keep_running_tag(tags.iter().map(|t| (t.key(), t.value()))))
    }
}

pub(crate) fn notebook_is_running(status: Option<&NotebookInstanceStatus>) -> bool {
    matches!(status, Some(NotebookInstanceStatus::InService))
}

pub(crate) fn has_keep_running_tag<'a>(
    tags: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> bool {
    tags.into_iter()
        .any(|(key, value)| KEEP_RUNNING_TAG.matches(Some(key), Some(value)))
}

/// In-service notebook names on one ListNotebookInstances page, plus the next token
pub(crate) fn running_notebooks_page(
    output: &ListNotebookInstancesOutput,
) -> (Vec<ResourceId>, Option<String>) {
    let mut running = Vec::new();
    for notebook in output.notebook_instances() {
        let name = notebook.notebook_instance_name();
        if notebook_is_running(notebook.notebook_instance_status()) && !name.is_empty() {
            running.push(name.to_string());
        } else {
            debug!(
                "Skipping notebook {} in status {:?}",
                name,
                notebook.notebook_instance_status()
            );
        }
    }
    (running, output.next_token().map(str::to_string))
}

#[async_trait]
impl ResourceStopper for SageMakerStopper {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn list_running(&self) -> Result<Vec<ResourceId>> {
        drain_pages(|token| async move {
            self.client
                .list_notebook_instances()
                .set_next_token(token)
                .send()
                .await
                .map(|response| running_notebooks_page(&response))
                .map_err(StopperError::aws(KIND, "ListNotebookInstances"))
        })
        .await
    }

    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>> {
        let mut protected = Vec::new();
        for name in candidates {
            if self.is_tagged_to_keep_running(name).await? {
                protected.push(name.clone());
            }
        }
        Ok(protected)
    }

    async fn stop(&self, ids: &[ResourceId]) -> Result<()> {
        for name in ids {
            self.client
                .stop_notebook_instance()
                .notebook_instance_name(name)
                .send()
                .await
                .map_err(StopperError::aws(KIND, "StopNotebookInstance"))?;
            debug!("Stop requested for notebook {}", name);
        }
        Ok(())
    }
}
