//! Tests for the provisioning run state machine.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use masterless_cli::application::services::provision::{check_connection, provision};
use masterless_cli::domain::config::AgentInstall;
use masterless_cli::domain::{ConfigError, Phase, ProvisionError};
use masterless_cli::infra::StdFs;

use crate::mocks::{Call, Project, RecordingReporter, RecordingTransport};

const CONVERGE_PREFIX: &str = "cd /tmp/stage && /opt/puppetlabs/bin/puppet apply --verbose";

#[tokio::test]
async fn test_full_run_call_sequence() {
    let project = Project::new();
    let mut config = project.config();
    config.hiera_config_path = Some(project.path("hiera.yaml"));
    config.module_paths = vec![project.module_dir("site"), project.module_dir("vendor")];

    let transport = RecordingTransport::new();
    let reporter = RecordingReporter::new();
    let report = provision(&transport, &StdFs, &reporter, &config)
        .await
        .expect("provision");

    let calls = transport.calls();
    let expected_prefix = [
        Call::Start("mkdir -p /tmp/stage".to_string()),
        Call::Start("chmod 777 /tmp/stage".to_string()),
        Call::UploadFile {
            remote: "/tmp/stage/hiera.yaml".to_string(),
            contents: b"---\nversion: 5\n".to_vec(),
        },
        Call::Start("mkdir -p /tmp/stage/module-0".to_string()),
        Call::Start("chmod 777 /tmp/stage/module-0".to_string()),
    ];
    assert_eq!(&calls[..expected_prefix.len()], &expected_prefix);

    assert_eq!(
        transport.dir_uploads(),
        ["/tmp/stage/module-0", "/tmp/stage/module-1"]
    );
    assert_eq!(
        transport.file_uploads(),
        ["/tmp/stage/hiera.yaml", "/tmp/stage/manifests/site.pp"]
    );

    let commands = transport.commands();
    let converge = commands.last().expect("converge command");
    assert_eq!(
        converge,
        &format!(
            "{CONVERGE_PREFIX} --modulepath=/tmp/stage/module-0:/tmp/stage/module-1 \
             --hiera_config=/tmp/stage/hiera.yaml /tmp/stage/manifests/site.pp"
        )
    );
    assert_eq!(&report.command, converge);
    assert_eq!(report.manifest_target, "/tmp/stage/manifests/site.pp");
    assert_eq!(report.hiera_config.as_deref(), Some("/tmp/stage/hiera.yaml"));
    assert!(!report.cleaned);
}

#[tokio::test]
async fn test_module_uploads_copy_contents_in_declaration_order() {
    let project = Project::new();
    let mut config = project.config();
    let names = ["a", "b", "c", "d"];
    config.module_paths = names.iter().map(|n| project.module_dir(n)).collect();

    let transport = RecordingTransport::new();
    let report = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("provision");

    let uploads: Vec<(String, String)> = transport
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::UploadDir { remote, local } => Some((remote, local.to_string_lossy().into_owned())),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), names.len());
    for (i, (remote, local)) in uploads.iter().enumerate() {
        assert_eq!(remote, &format!("/tmp/stage/module-{i}"));
        assert!(
            local.ends_with(&format!("{}/", names[i])),
            "upload {i} should copy contents of {}: got {local}",
            names[i]
        );
    }
    assert_eq!(
        report.module_paths,
        (0..names.len()).map(|i| format!("/tmp/stage/module-{i}")).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_no_modules_and_no_hiera_omit_flags() {
    let project = Project::new();
    let config = project.config();

    let transport = RecordingTransport::new();
    provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("provision");

    assert_eq!(transport.file_uploads(), ["/tmp/stage/manifests/site.pp"]);
    let commands = transport.commands();
    assert_eq!(
        commands.last().unwrap(),
        &format!("{CONVERGE_PREFIX} /tmp/stage/manifests/site.pp")
    );
}

#[tokio::test]
async fn test_manifest_directory_uploaded_whole() {
    let project = Project::new();
    std::fs::create_dir_all(project.path("manifests")).unwrap();
    std::fs::write(project.path("manifests/site.pp"), "node default {}").unwrap();
    let mut config = project.config();
    config.manifest_file = project.path("manifests");

    let transport = RecordingTransport::new();
    let report = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("provision");

    assert_eq!(transport.dir_uploads(), ["/tmp/stage/manifests"]);
    assert!(transport.file_uploads().is_empty());
    assert_eq!(report.manifest_target, "/tmp/stage/manifests");
    assert!(report.command.ends_with(" /tmp/stage/manifests"));
}

#[tokio::test]
async fn test_facts_sorted_before_binary_and_sudo_wraps() {
    let project = Project::new();
    let mut config = project.config();
    config.facts.insert("role".to_string(), "web server".to_string());
    config.facts.insert("env".to_string(), "prod".to_string());
    config.sudo = true;

    let transport = RecordingTransport::new();
    let report = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("provision");

    assert_eq!(
        report.command,
        "cd /tmp/stage && FACTER_env=prod FACTER_role='web server' \
         /opt/puppetlabs/bin/puppet apply --verbose /tmp/stage/manifests/site.pp"
    );
    let sent = transport.commands();
    let converge = sent.last().unwrap();
    assert!(converge.starts_with("sudo -n sh -c 'cd /tmp/stage && "), "got: {converge}");
    // Staging dirs are created as the connecting user.
    assert_eq!(sent[0], "mkdir -p /tmp/stage");
}

#[tokio::test]
async fn test_converge_failure_aborts_without_cleanup() {
    let project = Project::new();
    let mut config = project.config();
    config.clean_staging_dir = true;

    let transport = RecordingTransport::new().exit_with("puppet apply", 4);
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    match &err {
        ProvisionError::Command { phase, source } => {
            assert_eq!(*phase, Phase::Converge);
            assert_eq!(source.status, 4);
            assert!(source.command.contains("puppet apply"));
        }
        other => panic!("expected command error, got {other:?}"),
    }
    assert!(!err.converged());
    assert!(!transport.commands().iter().any(|c| c.starts_with("rm -fr")));
}

#[tokio::test]
async fn test_converge_failure_ignored_when_configured() {
    let project = Project::new();
    let mut config = project.config();
    config.ignore_exit_codes = true;
    config.clean_staging_dir = true;

    let transport = RecordingTransport::new().exit_with("puppet apply", 2);
    let reporter = RecordingReporter::new();
    let report = provision(&transport, &StdFs, &reporter, &config)
        .await
        .expect("ignored exit status must not abort");

    assert_eq!(report.ignored_failures.len(), 1);
    assert_eq!(report.ignored_failures[0].status, 2);
    assert!(report.cleaned);
    assert_eq!(transport.commands().last().unwrap(), "rm -fr /tmp/stage");
    assert!(reporter.warnings().iter().any(|w| w.contains("(ignored)")));
}

#[tokio::test]
async fn test_mkdir_failure_is_not_ignored() {
    let project = Project::new();
    let mut config = project.config();
    config.ignore_exit_codes = true;

    let transport = RecordingTransport::new().exit_with("mkdir -p /tmp/stage", 1);
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Stage));
    assert_eq!(transport.commands(), ["mkdir -p /tmp/stage"]);
}

#[tokio::test]
async fn test_chmod_failure_is_hard_failure() {
    let project = Project::new();
    let config = project.config();

    let transport = RecordingTransport::new().exit_with("chmod 777 /tmp/stage", 1);
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Stage));
    assert!(transport.file_uploads().is_empty());
}

#[tokio::test]
async fn test_module_upload_failure_stops_run() {
    let project = Project::new();
    let mut config = project.config();
    config.module_paths = vec![project.module_dir("a"), project.module_dir("b")];

    let transport = RecordingTransport::new().failing_upload("module-0");
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Modules));
    assert_eq!(transport.dir_uploads(), ["/tmp/stage/module-0"]);
    assert!(!transport.commands().iter().any(|c| c.contains("puppet")));
}

#[tokio::test]
async fn test_cleanup_failure_after_ignored_exit_is_not_clean_convergence() {
    let project = Project::new();
    let mut config = project.config();
    config.clean_staging_dir = true;
    config.ignore_exit_codes = true;

    let transport = RecordingTransport::new()
        .exit_with("puppet apply", 4)
        .exit_with("rm -fr", 1);
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Cleanup));
    assert!(!err.converged());
    assert_eq!(
        err.to_string(),
        "provisioning finished with ignored failures but removing the staging directory failed"
    );
    let ProvisionError::Cleanup { report, .. } = err else {
        panic!("expected cleanup error");
    };
    assert_eq!(report.ignored_failures[0].status, 4);
}

#[tokio::test]
async fn test_cleanup_failure_reports_convergence() {
    let project = Project::new();
    let mut config = project.config();
    config.clean_staging_dir = true;
    config.sudo = true;

    let transport = RecordingTransport::new().exit_with("rm -fr", 1);
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    assert!(err.converged());
    assert_eq!(err.phase(), Some(Phase::Cleanup));
    let ProvisionError::Cleanup { report, .. } = err else {
        panic!("expected cleanup error");
    };
    assert!(!report.cleaned);
    assert_eq!(
        transport.commands().last().unwrap(),
        "sudo -n sh -c 'rm -fr /tmp/stage'"
    );
}

#[tokio::test]
async fn test_invalid_module_path_fails_before_remote_calls() {
    let project = Project::new();
    let mut config = project.config();
    config.module_paths = vec![project.module_dir("ok"), project.path("site.pp")];

    let transport = RecordingTransport::new();
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();

    let ProvisionError::Config(config_err) = err else {
        panic!("expected config error");
    };
    assert!(matches!(config_err, ConfigError::ModulePathNotDirectory { index: 1, .. }));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_agent_install_runs_between_manifest_and_converge() {
    let project = Project::new();
    let mut config = project.config();
    config.agent = Some(AgentInstall {
        installer_url: "https://example.com/install.sh".to_string(),
    });

    let transport = RecordingTransport::new();
    provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("provision");

    let commands = transport.commands();
    let curl = commands.iter().position(|c| c.starts_with("curl ")).unwrap();
    let converge = commands.iter().position(|c| c.contains("puppet apply")).unwrap();
    let manifests = commands
        .iter()
        .position(|c| c == "chmod 777 /tmp/stage/manifests")
        .unwrap();
    assert!(manifests < curl && curl < converge);
    assert_eq!(converge - curl, 4);
}

#[tokio::test]
async fn test_agent_failure_aborts_in_agent_phase() {
    let project = Project::new();
    let mut config = project.config();
    config.agent = Some(AgentInstall {
        installer_url: "https://example.com/install.sh".to_string(),
    });

    let transport = RecordingTransport::new().exit_with("curl ", 22);
    let err = provision(&transport, &StdFs, &RecordingReporter::new(), &config)
        .await
        .unwrap_err();
    assert_eq!(err.phase(), Some(Phase::Agent));
}

#[tokio::test]
async fn test_second_run_issues_identical_calls() {
    let project = Project::new();
    let mut config = project.config();
    config.module_paths = vec![project.module_dir("a")];
    config.hiera_config_path = Some(project.path("hiera.yaml"));

    let first = RecordingTransport::new();
    let second = RecordingTransport::new();
    let a = provision(&first, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("first run");
    let b = provision(&second, &StdFs, &RecordingReporter::new(), &config)
        .await
        .expect("second run");

    assert_eq!(first.calls(), second.calls());
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_check_connection_unreachable_is_stage_error() {
    let transport = RecordingTransport::new().unreachable("true");
    let err = check_connection(&transport, &RecordingReporter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Transfer { phase: Phase::Stage, .. }));
    assert_eq!(transport.commands(), ["true"]);
}
