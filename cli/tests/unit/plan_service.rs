//! Tests for the dry-run plan.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use masterless_cli::application::services::plan::plan;
use masterless_cli::application::services::provision::provision;
use masterless_cli::domain::ConfigError;
use masterless_cli::infra::StdFs;

use crate::mocks::{Project, RecordingReporter, RecordingTransport};

#[tokio::test]
async fn test_plan_matches_what_provision_runs() {
    let project = Project::new();
    let mut config = project.config();
    config.hiera_config_path = Some(project.path("hiera.yaml"));
    config.module_paths = vec![project.module_dir("a"), project.module_dir("b")];
    config.facts.insert("role".to_string(), "db".to_string());

    let planned = plan(&StdFs, &config).await.expect("plan");
    let report = provision(&RecordingTransport::new(), &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("provision");

    assert_eq!(planned.command, report.command);
    assert_eq!(planned.module_paths, report.module_paths);
    assert_eq!(planned.manifest_target, report.manifest_target);
    assert_eq!(planned.hiera_config, report.hiera_config);
    assert_eq!(planned.staging, report.staging);
}

#[tokio::test]
async fn test_plan_serializes_layout() {
    let project = Project::new();
    let mut config = project.config();
    config.sudo = true;

    let planned = plan(&StdFs, &config).await.expect("plan");
    let json = serde_json::to_value(&planned).expect("json");
    assert_eq!(json["staging"]["root"], "/tmp/stage");
    assert_eq!(json["manifest_target"], "/tmp/stage/manifests/site.pp");
    assert_eq!(json["sudo"], true);
    assert!(json["hiera_config"].is_null());
}

#[tokio::test]
async fn test_plan_rejects_invalid_paths() {
    let project = Project::new();
    let mut config = project.config();
    config.manifest_file = project.path("missing.pp");

    let err = plan(&StdFs, &config).await.unwrap_err();
    assert!(matches!(err, ConfigError::ManifestFileInvalid { .. }));
}
