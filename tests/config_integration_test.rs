use anyhow::Result;
use dashboard_fetch::config::toml_config::TomlConfig;
use dashboard_fetch::utils::validation::Validate;
use dashboard_fetch::{
    ApiRequest, DashboardApi, FetchConfig, ListQuery, Resource, ServerSideFetcher,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

/// A config file drives both the fallback base URL and the per-resource auth profile.
#[tokio::test]
async fn test_config_file_drives_fetcher() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let config_content = format!(
        r#"
[deployment]
base_url = "{}"

[internal_auth]
header = "x-internal-key"
api_key = "from-file"

[resources.reports]
requires_internal_auth = true
"#,
        server.base_url()
    );
    let config_path = temp_dir.path().join("dashboard.toml");
    tokio::fs::write(&config_path, config_content).await?;

    let file_config = TomlConfig::from_file(&config_path)?;
    file_config.validate()?;
    let config = file_config.into_fetch_config();

    let reports_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/report")
            .header("x-internal-key", "from-file");
        then.status(200).json_body(json!({"data": [{"term": "Fall"}]}));
    });

    let fetcher = ServerSideFetcher::new(config.clone());
    let api = DashboardApi::from_config(fetcher, &config)?;
    let page = api.list(None, Resource::Report, &ListQuery::default()).await;

    assert_eq!(page.items.len(), 1);
    reports_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_unset_variables_leave_fetcher_degraded_not_crashed() -> Result<()> {
    let toml_content = r#"
[deployment]
base_url = "${DASHBOARD_TEST_UNSET_BASE}"

[internal_auth]
api_key = "${DASHBOARD_TEST_UNSET_KEY}"
"#;

    let file_config = TomlConfig::from_toml_str_with(toml_content, |_| None)?;
    file_config.validate()?;
    let config = file_config.into_fetch_config();
    assert_eq!(config.fallback_base_url(), None);
    assert_eq!(config.internal_api_key(), None);

    let fetcher = ServerSideFetcher::new(config);
    let value = fetcher
        .fetch(None, &ApiRequest::new("/v1/student").internal_auth(true))
        .await;
    assert!(value.is_null());
    Ok(())
}

#[test]
fn test_env_lookup_matches_file_defaults() {
    let from_env = FetchConfig::from_lookup(|_| None);
    let from_file = TomlConfig::default().into_fetch_config();
    assert_eq!(from_env, from_file);
}
