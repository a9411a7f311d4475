//! End-to-end checks against a real AWS account
//!
//! These tests require AWS credentials. They only ever run the workflow in
//! dry-run mode, so nothing is stopped.
//! Run with: RESOURCE_STOPPER_E2E=1 cargo test --test aws_e2e_test --features e2e -- --ignored

#![cfg(feature = "e2e")]

use resource_stopper::aws;
use resource_stopper::config::AwsConfig;
use resource_stopper::runner::run_kinds;
use resource_stopper::ResourceKind;
use std::env;

fn should_run_e2e() -> bool {
    env::var("RESOURCE_STOPPER_E2E").is_ok()
}

#[tokio::test]
#[ignore] // Requires AWS credentials and explicit opt-in
async fn test_dry_run_every_kind() {
    if !should_run_e2e() {
        eprintln!("Skipping E2E test. Set RESOURCE_STOPPER_E2E=1 to run");
        return;
    }

    let sdk_config = aws::load_sdk_config(&AwsConfig::default()).await;
    let ctx = aws::resolve_context(&sdk_config)
        .await
        .expect("caller identity should resolve");

    let summary = run_kinds(&ResourceKind::ALL, true, |kind| {
        aws::build_stopper(kind, &sdk_config, &ctx)
    })
    .await;

    for outcome in &summary.outcomes {
        if let Some(report) = &outcome.report {
            assert!(!report.stopped, "dry run must not stop {}", outcome.kind);
            for id in &report.stop_set {
                assert!(report.candidates.contains(id));
                assert!(!report.protected.contains(id));
            }
        }
    }
    println!("{}", summary.to_table());
}

#[tokio::test]
#[ignore]
async fn test_caller_identity_resolves() {
    if !should_run_e2e() {
        return;
    }

    let sdk_config = aws::load_sdk_config(&AwsConfig::default()).await;
    let account = aws::resolve_account_id(&sdk_config)
        .await
        .expect("caller identity should resolve");
    assert_eq!(account.len(), 12);
    assert!(account.chars().all(|c| c.is_ascii_digit()));
}
