//! Entry point: run the stop workflow for each configured kind
//!
//! Identity is resolved once, before any kind runs; a failure there aborts
//! the whole invocation. After that each kind is processed to completion
//! before the next one starts. A kind that fails is logged and recorded in
//! the summary and the runner moves on to the next kind.

use crate::aws;
use crate::config::Config;
use crate::error::Result;
use crate::exit_codes::codes;
use crate::provider::ResourceKind;
use crate::stopper::{self, ResourceStopper, StopReport};
use chrono::{DateTime, Utc};
use comfy_table::Table;
use serde::Serialize;
use tracing::{error, info};

/// Result of one kind's workflow
#[derive(Debug, Clone, Serialize)]
pub struct KindOutcome {
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<StopReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KindOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything one invocation did, in processing order
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub outcomes: Vec<KindOutcome>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &KindOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn exit_code(&self) -> i32 {
        if self.failures().next().is_some() {
            codes::PARTIAL_FAILURE
        } else {
            codes::SUCCESS
        }
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Kind", "Running", "Protected", "To stop", "Result"]);
        for outcome in &self.outcomes {
            let label = outcome.kind.label();
            match (&outcome.report, &outcome.error) {
                (_, Some(err)) => {
                    table.add_row(vec![label, "-", "-", "-", err.as_str()]);
                }
                (Some(report), None) => {
                    let result = if report.stopped {
                        "stopped"
                    } else if report.dry_run && !report.stop_set.is_empty() {
                        "dry run"
                    } else {
                        "nothing to stop"
                    };
                    table.add_row(vec![
                        label.to_string(),
                        report.candidates.len().to_string(),
                        report.protected.len().to_string(),
                        report.stop_set.len().to_string(),
                        result.to_string(),
                    ]);
                }
                (None, None) => {}
            }
        }
        table
    }
}

/// Run `kinds` in order with adapters from `build`
///
/// Failures are contained per kind.
pub async fn run_kinds<F>(kinds: &[ResourceKind], dry_run: bool, mut build: F) -> RunSummary
where
    F: FnMut(ResourceKind) -> Box<dyn ResourceStopper>,
{
    let started_at = Utc::now();
    let mut outcomes = Vec::with_capacity(kinds.len());

    for &kind in kinds {
        info!("#==== {} ====#", kind);
        let stopper = build(kind);
        let outcome = match stopper::run(stopper.as_ref(), dry_run).await {
            Ok(report) => KindOutcome {
                kind,
                report: Some(report),
                error: None,
            },
            Err(e) => {
                error!("Failed to stop {}: {}", kind.plural_label(), e);
                KindOutcome {
                    kind,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        dry_run,
        outcomes,
    };
    let failed = summary.failures().count();
    if failed == 0 {
        info!("Done!");
    } else {
        error!("{} of {} resource kinds failed", failed, kinds.len());
    }
    summary
}

/// Resolve identity and run every configured kind against AWS
pub async fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;

    let sdk_config = aws::load_sdk_config(&config.aws).await;
    let ctx = aws::resolve_context(&sdk_config).await?;

    if config.stopper.dry_run {
        info!("Dry run: no resources will be stopped");
    }

    Ok(run_kinds(&config.stopper.kinds, config.stopper.dry_run, |kind| {
        aws::build_stopper(kind, &sdk_config, &ctx)
    })
    .await)
}
