// ABOUTME: Integration tests for config discovery and environment overrides.
// ABOUTME: Uses temp directories for config files and temp-env for variables.

use coreauto::config::{Config, init_config};
use coreauto::error::Error;
use std::fs;
use std::time::Duration;

const ALL_OVERRIDES: [&str; 11] = [
    "CLIENT",
    "SCOPE",
    "AUTOMATION_ACCOUNT",
    "AWS_REGION",
    "BUCKET_REGION",
    "BUCKET_NAME",
    "ARTEFACT_BUCKET_NAME",
    "DYNAMODB_REGION",
    "AUTOMATION_ROLE_ARN",
    "USE_S3",
    "AWS_PROFILE",
];

fn without_overrides<R>(f: impl FnOnce() -> R) -> R {
    temp_env::with_vars_unset(ALL_OVERRIDES, f)
}

#[test]
fn resolve_without_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let config = without_overrides(|| Config::resolve(dir.path()).unwrap());

    assert_eq!(config, Config::default());
    assert_eq!(config.region, "us-east-1");
    assert!(matches!(config.client(), Err(Error::MissingSetting("CLIENT"))));
}

#[test]
fn discover_prefers_primary_file_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("coreauto.yml"), "client: primary\n").unwrap();
    fs::write(dir.path().join("coreauto.yaml"), "client: alternate\n").unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert_eq!(config.client.as_deref(), Some("primary"));
}

#[test]
fn discover_finds_config_in_dot_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(".coreauto")).unwrap();
    fs::write(
        dir.path().join(".coreauto/config.yml"),
        "client: hidden\nwait:\n  max_wait: 10m\n  poll_interval: 2s\n",
    )
    .unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert_eq!(config.client.as_deref(), Some("hidden"));
    assert_eq!(config.wait.max_wait, Duration::from_secs(600));
    assert_eq!(config.wait.poll_interval, Duration::from_secs(2));
}

#[test]
fn discover_without_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::discover(dir.path()),
        Err(Error::ConfigNotFound(_))
    ));
}

#[test]
fn environment_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("coreauto.yml"),
        "client: from-file\nautomation_account: \"111111111111\"\nregion: eu-west-1\n",
    )
    .unwrap();

    let config = without_overrides(|| {
        temp_env::with_vars(
            [
                ("CLIENT", Some("from-env")),
                ("AWS_REGION", Some("ap-southeast-2")),
                ("BUCKET_REGION", Some("us-west-2")),
                ("SCOPE", Some("dev-")),
            ],
            || Config::resolve(dir.path()).unwrap(),
        )
    });

    assert_eq!(config.client().unwrap(), "from-env");
    assert_eq!(config.automation_account().unwrap(), "111111111111");
    assert_eq!(config.region, "ap-southeast-2");
    assert_eq!(config.bucket_region(), "us-west-2");
    assert_eq!(config.dynamodb_region(), "ap-southeast-2");

    let names = config.resource_names().unwrap();
    assert_eq!(names.automation_bucket, "dev-from-env-core-automation-us-west-2");
    assert_eq!(names.clients_table, "dev-core-automation-clients");
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("coreauto.yml"), "client: [unclosed\n").unwrap();

    let result = without_overrides(|| Config::resolve(dir.path()));
    assert!(matches!(result, Err(Error::Yaml(_))));
}

#[test]
fn init_template_round_trips_through_discover() {
    let dir = tempfile::tempdir().unwrap();
    init_config(dir.path(), Some("acme"), Some("123456789012"), false).unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert_eq!(config.client.as_deref(), Some("acme"));
    assert_eq!(config.automation_account.as_deref(), Some("123456789012"));
}

#[test]
fn aws_profile_env_takes_precedence_over_configured_profile() {
    let config = Config {
        aws_profile: Some("from-flag".to_string()),
        ..Config::default()
    };

    temp_env::with_var("AWS_PROFILE", Some("from-env"), || {
        assert_eq!(config.resolved_profile(), "from-env");
    });
    temp_env::with_var_unset("AWS_PROFILE", || {
        assert_eq!(config.resolved_profile(), "from-flag");
    });
}
