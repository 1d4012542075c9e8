//! Tests for gateway configuration loading and repository selection.

mod support;

use df_gateway::db::{
    GatewayConfig, RepositoryError, RepositoryFactory, RepositoryType, StoreHealth,
};
use support::{config_file, with_scoped_env};

#[test]
fn test_defaults_without_file_or_env() {
    // The test binary runs from the crate directory, which has no gateway.toml.
    let config = with_scoped_env(&[], GatewayConfig::load).unwrap();

    assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    assert_eq!(config.influx.url, "http://localhost:8086");
    assert_eq!(config.influx.tag_key, "dataItemId");
    assert_eq!(config.mongo.uri, "mongodb://127.0.0.1:27017");
    assert_eq!(config.server.bind_address(), "0.0.0.0:3000");
    assert_eq!(config.server.body_limit_bytes, 16 * 1024 * 1024);
}

#[test]
fn test_env_overrides_defaults() {
    let config = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("remote")),
            ("INFLUX_URL", Some("http://influx:8086")),
            ("INFLUX_TOKEN", Some("secret")),
            ("INFLUX_TAG_KEY", Some("sensor")),
            ("MONGO_DATABASE", Some("Plant")),
            ("PORT", Some("8081")),
        ],
        GatewayConfig::load,
    )
    .unwrap();

    assert_eq!(config.repository_type().unwrap(), RepositoryType::Remote);
    assert_eq!(config.influx.url, "http://influx:8086");
    assert_eq!(config.influx.token, "secret");
    assert_eq!(config.influx.tag_key, "sensor");
    assert_eq!(config.influx.bucket, "CCAM_DF_Prep_Project");
    assert_eq!(config.mongo.database, "Plant");
    assert_eq!(config.server.port, 8081);
}

#[test]
fn test_file_then_env_precedence() {
    let file = config_file(
        r#"
[repository]
type = "remote"

[influx]
token = "from-file"
bucket = "file-bucket"

[server]
port = 9000
"#,
    );
    let path = file.path().to_string_lossy().to_string();

    let config = with_scoped_env(
        &[
            ("GATEWAY_CONFIG", Some(path.as_str())),
            ("INFLUX_TOKEN", Some("from-env")),
        ],
        GatewayConfig::load,
    )
    .unwrap();

    assert_eq!(config.influx.token, "from-env");
    assert_eq!(config.influx.bucket, "file-bucket");
    assert_eq!(config.server.port, 9000);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let result = with_scoped_env(
        &[("GATEWAY_CONFIG", Some("/definitely/not/here/gateway.toml"))],
        GatewayConfig::load,
    );
    assert!(matches!(result, Err(RepositoryError::ConfigurationError { .. })));
}

#[test]
fn test_malformed_file_is_error() {
    let file = config_file("[repository\ntype = ");
    let path = file.path().to_string_lossy().to_string();

    let result = with_scoped_env(&[("GATEWAY_CONFIG", Some(path.as_str()))], GatewayConfig::load);
    let err = result.unwrap_err();
    assert!(err.message().contains("Failed to parse config file"));
}

#[test]
fn test_invalid_numeric_env_is_error() {
    let result = with_scoped_env(&[("PORT", Some("eighty"))], GatewayConfig::load);
    let err = result.unwrap_err();
    assert!(err.message().contains("PORT"));
}

#[test]
fn test_repository_type_from_env() {
    let local = with_scoped_env(&[], RepositoryType::from_env);
    assert_eq!(local, RepositoryType::Local);

    let remote = with_scoped_env(&[("REPOSITORY_TYPE", Some("REMOTE"))], RepositoryType::from_env);
    assert_eq!(remote, RepositoryType::Remote);

    let unknown = with_scoped_env(&[("REPOSITORY_TYPE", Some("sqlite"))], RepositoryType::from_env);
    assert_eq!(unknown, RepositoryType::Local);
}

#[tokio::test]
async fn test_factory_builds_local_repositories() {
    let repos = RepositoryFactory::create(&GatewayConfig::default()).await.unwrap();

    assert!(repos.time_series.health_check().await.unwrap());
    assert!(repos.dictionaries.health_check().await.unwrap());
}

#[cfg(not(feature = "remote-repo"))]
#[tokio::test]
async fn test_remote_requires_feature() {
    let mut config = GatewayConfig::default();
    config.repository.repo_type = "remote".to_string();

    let err = RepositoryFactory::create(&config).await.err().unwrap();
    assert!(err.message().contains("remote-repo"));
}
