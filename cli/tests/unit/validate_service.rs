//! Tests for local path validation.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use masterless_cli::application::services::validate::{ensure_valid, validate_paths};
use masterless_cli::domain::ConfigError;
use masterless_cli::infra::StdFs;

use crate::mocks::Project;

#[tokio::test]
async fn test_valid_project_has_no_errors() {
    let project = Project::new();
    let mut config = project.config();
    config.hiera_config_path = Some(project.path("hiera.yaml"));
    config.module_paths = vec![project.module_dir("modules")];
    config.manifest_dir = Some(project.module_dir("extra"));

    assert!(validate_paths(&StdFs, &config).await.is_empty());
    ensure_valid(&StdFs, &config).await.expect("valid");
}

#[tokio::test]
async fn test_module_path_that_is_a_file_reports_its_index() {
    let project = Project::new();
    let mut config = project.config();
    config.module_paths = vec![
        project.module_dir("a"),
        project.module_dir("b"),
        project.path("site.pp"),
    ];

    let err = ensure_valid(&StdFs, &config).await.unwrap_err();
    assert!(matches!(err, ConfigError::ModulePathNotDirectory { index: 2, .. }));
}

#[tokio::test]
async fn test_missing_module_path_is_invalid() {
    let project = Project::new();
    let mut config = project.config();
    config.module_paths = vec![project.path("nope")];

    let err = ensure_valid(&StdFs, &config).await.unwrap_err();
    assert!(matches!(err, ConfigError::ModulePathInvalid { index: 0, .. }));
}

#[tokio::test]
async fn test_hiera_config_directory_rejected() {
    let project = Project::new();
    let mut config = project.config();
    config.hiera_config_path = Some(project.module_dir("hieradata"));

    let err = ensure_valid(&StdFs, &config).await.unwrap_err();
    assert!(matches!(err, ConfigError::HieraConfigNotFile { .. }));
}

#[tokio::test]
async fn test_manifest_dir_file_rejected() {
    let project = Project::new();
    let mut config = project.config();
    config.manifest_dir = Some(project.path("site.pp"));

    let err = ensure_valid(&StdFs, &config).await.unwrap_err();
    assert!(matches!(err, ConfigError::ManifestDirNotDirectory { .. }));
}

#[tokio::test]
async fn test_all_problems_collected_in_config_order() {
    let project = Project::new();
    let mut config = project.config();
    config.hiera_config_path = Some(project.path("missing.yaml"));
    config.module_paths = vec![project.path("site.pp")];
    config.manifest_file = project.path("missing.pp");

    let errors = validate_paths(&StdFs, &config).await;
    assert_eq!(errors.len(), 3);
    assert!(matches!(errors[0], ConfigError::HieraConfigInvalid { .. }));
    assert!(matches!(errors[1], ConfigError::ModulePathNotDirectory { index: 0, .. }));
    assert!(matches!(errors[2], ConfigError::ManifestFileInvalid { .. }));
}
