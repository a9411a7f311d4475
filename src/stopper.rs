//! Generic stop workflow
//!
//! Every resource kind goes through the same sequence:
//!
//! 1. list running candidates (adapter applies its eligibility rules and
//!    drains pagination before returning)
//! 2. stop early if there are none, without any tag lookups
//! 3. ask the adapter which candidates carry `KeepRunning=true`
//! 4. subtract the protected ids, keeping candidate order
//! 5. stop the remainder, unless this is a dry run
//!
//! The adapters in `crate::aws` implement [`ResourceStopper`]; [`run`] drives
//! them. Calls are strictly sequential and nothing is retried.

use crate::error::Result;
use crate::provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Capabilities a resource kind supplies to the stop workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceStopper: Send + Sync {
    /// Kind handled by this adapter
    fn kind(&self) -> ResourceKind;

    /// Running resources that are eligible to be stopped, across all pages
    async fn list_running(&self) -> Result<Vec<ResourceId>>;

    /// Subset of `candidates` tagged to keep running
    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>>;

    /// Stop or pause every resource in `ids`
    async fn stop(&self, ids: &[ResourceId]) -> Result<()>;
}

/// Outcome of one workflow run for one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopReport {
    pub kind: ResourceKind,
    pub candidates: Vec<ResourceId>,
    /// Candidates excluded because of the keep-running tag
    pub protected: Vec<ResourceId>,
    pub stop_set: Vec<ResourceId>,
    pub dry_run: bool,
    /// True only when the stop call was issued and succeeded
    pub stopped: bool,
}

impl StopReport {
    fn empty(kind: ResourceKind, dry_run: bool) -> Self {
        Self {
            kind,
            candidates: Vec::new(),
            protected: Vec::new(),
            stop_set: Vec::new(),
            dry_run,
            stopped: false,
        }
    }
}

/// Split `candidates` into (stop set, excluded) by membership in `protected`
///
/// Relative order of `candidates` is preserved in both halves. Protected ids
/// that are not candidates are ignored.
pub fn compute_stop_set(
    candidates: &[ResourceId],
    protected: &[ResourceId],
) -> (Vec<ResourceId>, Vec<ResourceId>) {
    let protected: HashSet<&str> = protected.iter().map(String::as_str).collect();
    candidates
        .iter()
        .cloned()
        .partition(|id| !protected.contains(id.as_str()))
}

/// Run the list → tag-check → filter → stop workflow for one adapter
pub async fn run(stopper: &dyn ResourceStopper, dry_run: bool) -> Result<StopReport> {
    let kind = stopper.kind();
    let mut report = StopReport::empty(kind, dry_run);

    let candidates = stopper.list_running().await?;
    if candidates.is_empty() {
        info!(
            "No {} eligible for stopping, nothing left to do.",
            kind.plural_label()
        );
        return Ok(report);
    }
    info!(
        "The following {} are running and eligible to stop: {:?}",
        kind.label_for(candidates.len()),
        candidates
    );

    info!("Checking whether any resources are tagged to keep running...");
    let tagged = stopper.list_protected(&candidates).await?;
    let (stop_set, protected) = compute_stop_set(&candidates, &tagged);

    if protected.is_empty() {
        info!("No resources tagged to keep running. All running resources will be stopped.");
    } else {
        info!(
            "{} {} tagged with {} and will not be stopped: {:?}",
            protected.len(),
            kind.label_for(protected.len()),
            KEEP_RUNNING_TAG,
            protected
        );
    }

    report.candidates = candidates;
    report.protected = protected;
    report.stop_set = stop_set;

    if report.stop_set.is_empty() {
        info!("No {} to stop.", kind.plural_label());
        return Ok(report);
    }

    info!(
        "Stopping the following {}: {:?}",
        kind.label_for(report.stop_set.len()),
        report.stop_set
    );
    if dry_run {
        info!("Dry run enabled, skipping actual stop.");
        return Ok(report);
    }

    stopper.stop(&report.stop_set).await?;
    report.stopped = true;
    info!(
        "{} {} successfully stopped.",
        report.stop_set.len(),
        kind.label_for(report.stop_set.len())
    );

    Ok(report)
}
