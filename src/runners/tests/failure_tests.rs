use super::{closed_port_url, quick_config, silent_server_url};
use crate::SandboxConfig;
use crate::errors::ErrorKind;
use crate::runners::web::execute;
use mockito::Server;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_no_target_in_text() {
    let result = execute("Hi, please call the helpdesk about your account", &quick_config()).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("TargetNotFound: "));
    assert!(result.actions_taken.is_empty());
    assert_eq!(result.report_label(), "could not execute target");
}

#[tokio::test]
async fn test_bad_targets_never_succeed() {
    let inputs = [
        "",
        "   ",
        "::::",
        "http://",
        "http://[bad",
        "javascript:alert(1)",
        "ftp://files.example.com/payload.exe",
    ];

    for input in inputs {
        let result = execute(input, &quick_config()).await;
        assert!(!result.success, "{:?} should not succeed", input);
        assert!(!result.errors.is_empty(), "{:?} should record an error", input);
        assert!(result.has_error(ErrorKind::TargetNotFound), "{:?}", input);
    }
}

#[tokio::test]
async fn test_unreachable_first_hop() {
    let url = format!("{}/login", closed_port_url().await);
    let result = execute(&url, &quick_config()).await;

    assert!(!result.success);
    assert!(result.has_error(ErrorKind::FetchError));
    assert!(result.redirects.is_empty());
    assert!(result.forms_found.is_empty());
    assert!(
        result
            .actions_taken
            .contains(&format!("Failed to fetch URL: {}", url))
    );
}

#[tokio::test]
async fn test_first_hop_timeout() {
    let url = format!("{}/", silent_server_url().await);
    let config = SandboxConfig {
        timeout_per_hop_ms: 200,
        ..SandboxConfig::default()
    };

    let started = Instant::now();
    let result = execute(&url, &config).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!result.success);
    assert!(result.has_error(ErrorKind::TimeoutError));
}

#[tokio::test]
async fn test_later_hop_failure_is_partial() {
    let dead = closed_port_url().await;
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/start")
        .with_status(302)
        .with_header("location", &format!("{}/next", dead))
        .create_async()
        .await;

    let result = execute(&format!("{}/start", server.url()), &quick_config()).await;

    assert!(result.success);
    assert!(result.has_error(ErrorKind::FetchError));
    assert_eq!(result.redirects.len(), 1);
    assert!(result.is_partial());
    assert_eq!(result.report_label(), "executed with partial results");
}

#[tokio::test]
async fn test_overall_budget_cuts_the_loop() {
    let silent = silent_server_url().await;
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/start")
        .with_status(302)
        .with_header("location", &format!("{}/hang", silent))
        .create_async()
        .await;

    let config = SandboxConfig {
        timeout_per_hop_ms: 30_000,
        overall_timeout_ms: Some(500),
        ..SandboxConfig::default()
    };

    let started = Instant::now();
    let result = execute(&format!("{}/start", server.url()), &config).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(result.success);
    assert!(result.has_error(ErrorKind::TimeoutError));
    assert_eq!(result.redirects.len(), 1);
}
