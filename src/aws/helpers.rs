//! Helper functions for AWS adapters
//!
//! The per-resource tag APIs (SageMaker, RDS, Neptune) are addressed by ARN,
//! while listing APIs return bare identifiers. These helpers bridge the two.
//! [`drain_pages`] is the one pagination loop every adapter goes through.

use crate::error::Result;
use std::future::Future;

/// Call `fetch` until the API stops returning a continuation token
///
/// `fetch` receives the token from the previous page (`None` first) and
/// returns that page's items with the next token. An empty token ends the
/// loop like a missing one. Pages are requested one at a time and the first
/// error aborts without returning partial results.
pub async fn drain_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let (page, next) = fetch(token.take()).await?;
        items.extend(page);
        match next.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    Ok(items)
}

/// Builds ARNs for one partition/region/account
#[derive(Debug, Clone, Copy)]
pub struct ResourceArn<'a> {
    partition: &'a str,
    region: &'a str,
    account_id: &'a str,
}

impl<'a> ResourceArn<'a> {
    pub fn new(partition: &'a str, region: &'a str, account_id: &'a str) -> Self {
        Self {
            partition,
            region,
            account_id,
        }
    }

    fn build(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.partition, service, self.region, self.account_id, resource
        )
    }

    pub fn sagemaker_notebook(&self, name: &str) -> String {
        self.build("sagemaker", &format!("notebook-instance/{}", name))
    }

    pub fn rds_db(&self, id: &str) -> String {
        self.build("rds", &format!("db:{}", id))
    }

    /// Aurora and Neptune clusters share the RDS ARN namespace
    pub fn rds_cluster(&self, id: &str) -> String {
        self.build("rds", &format!("cluster:{}", id))
    }
}

/// Reduce a Redshift tagged-resource name to its cluster identifier
///
/// DescribeTags reports `arn:aws:redshift:<region>:<account>:cluster:<id>`.
/// Names that are not ARNs are returned unchanged.
pub fn redshift_cluster_id_from_arn(resource_name: &str) -> &str {
    match resource_name.rsplit_once(":cluster:") {
        Some((_, id)) if resource_name.starts_with("arn:") => id,
        _ => resource_name,
    }
}
