//! Tests for remote directory creation and uploads.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use masterless_cli::application::services::transfer::{
    create_remote_dir, remove_remote_dir, upload_dir, upload_file,
};
use masterless_cli::domain::TransferError;
use masterless_cli::infra::StdFs;

use crate::mocks::{Call, Project, RecordingReporter, RecordingTransport};

#[tokio::test]
async fn test_create_remote_dir_quotes_path() {
    let transport = RecordingTransport::new();
    create_remote_dir(&transport, &RecordingReporter::new(), "/tmp/my stage")
        .await
        .unwrap();
    assert_eq!(
        transport.commands(),
        ["mkdir -p '/tmp/my stage'", "chmod 777 '/tmp/my stage'"]
    );
}

#[tokio::test]
async fn test_create_remote_dir_failure_names_directory() {
    let transport = RecordingTransport::new().exit_with("mkdir", 1);
    let err = create_remote_dir(&transport, &RecordingReporter::new(), "/root/stage")
        .await
        .unwrap_err();
    let TransferError::CreateDir { path, .. } = err else {
        panic!("expected CreateDir");
    };
    assert_eq!(path, "/root/stage");
}

#[tokio::test]
async fn test_upload_file_streams_bytes() {
    let project = Project::new();
    let transport = RecordingTransport::new();
    upload_file(&transport, &StdFs, &project.path("site.pp"), "/stage/manifests/site.pp")
        .await
        .unwrap();
    assert_eq!(
        transport.calls(),
        [Call::UploadFile {
            remote: "/stage/manifests/site.pp".to_string(),
            contents: b"node default { notify { 'hi': } }\n".to_vec(),
        }]
    );
}

#[tokio::test]
async fn test_upload_file_missing_local_is_open_error() {
    let project = Project::new();
    let transport = RecordingTransport::new();
    let err = upload_file(&transport, &StdFs, &project.path("missing.pp"), "/stage/x")
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Open { .. }));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_upload_dir_creates_target_first() {
    let project = Project::new();
    let modules = project.module_dir("modules");
    let transport = RecordingTransport::new();

    upload_dir(&transport, &RecordingReporter::new(), &modules, "/stage/module-0")
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::Start("mkdir -p /stage/module-0".to_string()));
    assert_eq!(calls[1], Call::Start("chmod 777 /stage/module-0".to_string()));
    let Call::UploadDir { remote, local } = &calls[2] else {
        panic!("expected directory upload");
    };
    assert_eq!(remote, "/stage/module-0");
    assert!(local.to_string_lossy().ends_with("modules/"));
}

#[tokio::test]
async fn test_upload_dir_failure_is_upload_error() {
    let project = Project::new();
    let transport = RecordingTransport::new().failing_upload("module-0");
    let err = upload_dir(
        &transport,
        &RecordingReporter::new(),
        &project.module_dir("modules"),
        "/stage/module-0",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TransferError::Upload { ref remote, .. } if remote == "/stage/module-0"));
}

#[tokio::test]
async fn test_remove_remote_dir_escalates() {
    let transport = RecordingTransport::new();
    remove_remote_dir(&transport, &RecordingReporter::new(), "/stage", true)
        .await
        .unwrap();
    assert_eq!(transport.commands(), ["sudo -n sh -c 'rm -fr /stage'"]);
}
