use std::fs;
use usdash::AppCommand;
use usdash::cli::fetch::FetchOptions;
use usdash::core::Resource;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(
        url_path: &str,
        status: u16,
        mock_response: &str,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
            upstream:
              base_url: "{base_url}"
              timeout_secs: 5
            cache:
              enabled: false
        "#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

#[test_log::test(tokio::test)]
async fn test_fetch_command_with_mock() {
    let mock_server = test_utils::create_mock_server(
        "/api/us/smart-money",
        200,
        r#"{"top_picks":[{"ticker":"NVDA","final_score":88.1}]}"#,
    )
    .await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = usdash::run_command(
        AppCommand::Fetch(FetchOptions::new(Resource::SmartMoney)),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Fetch command failed with: {:?}",
        result.err()
    );

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_fetch_command_degrades_on_backend_error() {
    let mock_server =
        test_utils::create_mock_server("/api/us/stock-chart/AMD", 502, "Bad Gateway").await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let options = FetchOptions {
        ticker: Some("amd".to_string()),
        ..FetchOptions::new(Resource::Chart)
    };
    // The fallback is printed; the command itself still succeeds.
    let result = usdash::run_command(
        AppCommand::Fetch(options),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "{:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_fetch_command_requires_ticker() {
    let config_file = test_utils::write_config("http://127.0.0.1:9");

    let result = usdash::run_command(
        AppCommand::Fetch(FetchOptions::new(Resource::AiSummary)),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_resources_command() {
    let result = usdash::run_command(AppCommand::Resources, None).await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_is_reported() {
    let config_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(config_file.path(), "upstream: [not, a, map]\n").unwrap();

    let result = usdash::run_command(
        AppCommand::Resources,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test_log::test(tokio::test)]
async fn test_serve_reports_bind_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = listener.local_addr().unwrap().to_string();

    let result = usdash::run_command(AppCommand::Serve { bind: Some(taken) }, None).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to bind"));
}
