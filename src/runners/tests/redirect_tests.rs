use super::{doc, quick_config};
use crate::errors::ErrorKind;
use crate::runners::web::execute;
use crate::SandboxConfig;
use mockito::Server;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_follows_chain_to_final_page() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let start = server
        .mock("GET", "/start")
        .with_status(301)
        .with_header("location", "/middle")
        .expect(1)
        .create_async()
        .await;
    let middle = server
        .mock("GET", "/middle")
        .with_status(302)
        .with_header("location", &format!("{}/final", base))
        .expect(1)
        .create_async()
        .await;
    let last = server
        .mock("GET", "/final")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(doc("", r#"<form action="/verify"><input name="code"></form>"#))
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/start", base), &quick_config()).await;

    start.assert_async().await;
    middle.assert_async().await;
    last.assert_async().await;

    assert!(result.success);
    assert_eq!(result.redirects.len(), 2);
    assert_eq!(result.redirects[0].from, format!("{}/start", base));
    assert_eq!(result.redirects[0].to, format!("{}/middle", base));
    assert_eq!(result.redirects[0].status.as_deref(), Some("301"));
    assert_eq!(result.redirects[0].reason.as_deref(), Some("Moved Permanently"));
    assert_eq!(result.redirects[1].to, format!("{}/final", base));
    assert_eq!(result.redirects[1].status.as_deref(), Some("302"));

    assert_eq!(result.forms_found.len(), 1);
    assert_eq!(result.forms_found[0].action, format!("{}/verify", base));
    assert!(!result.has_error(ErrorKind::RedirectLimitExceeded));
    assert!(!result.has_error(ErrorKind::RedirectLoopError));
    assert!(
        result
            .actions_taken
            .contains(&format!("Followed redirect to {}/middle", base))
    );
    assert_eq!(
        result.observations.last().map(String::as_str),
        Some("Total redirects followed: 2")
    );
}

#[tokio::test]
async fn test_stops_at_redirect_limit() {
    let mut server = Server::new_async().await;
    let config = SandboxConfig {
        max_redirects: 3,
        ..quick_config()
    };

    let mut mocks = Vec::new();
    for i in 0..6 {
        let hits = if i <= config.max_redirects { 1 } else { 0 };
        mocks.push(
            server
                .mock("GET", format!("/r{}", i).as_str())
                .with_status(302)
                .with_header("location", &format!("/r{}", i + 1))
                .expect(hits)
                .create_async()
                .await,
        );
    }

    let result = execute(&format!("{}/r0", server.url()), &config).await;

    for mock in &mocks {
        mock.assert_async().await;
    }
    assert!(result.success);
    assert_eq!(result.redirects.len(), 3);
    assert!(result.has_error(ErrorKind::RedirectLimitExceeded));
    assert!(result.is_partial());
}

#[tokio::test]
async fn test_zero_redirect_budget() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_status(307)
        .with_header("location", "/elsewhere")
        .create_async()
        .await;

    let config = SandboxConfig {
        max_redirects: 0,
        ..quick_config()
    };
    let result = execute(&format!("{}/", server.url()), &config).await;

    assert!(result.success);
    assert!(result.redirects.is_empty());
    assert!(result.has_error(ErrorKind::RedirectLimitExceeded));
}

#[tokio::test]
async fn test_self_redirect_is_a_loop() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/loop")
        .with_status(302)
        .with_header("location", "/loop")
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/loop", server.url()), &quick_config()).await;

    mock.assert_async().await;
    assert!(result.success);
    assert_eq!(result.redirects.len(), 1);
    assert!(result.has_error(ErrorKind::RedirectLoopError));
}

#[tokio::test]
async fn test_fragment_only_redirect_is_a_loop() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/page")
        .with_status(302)
        .with_header("location", "/page#again")
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/page", server.url()), &quick_config()).await;

    mock.assert_async().await;
    assert!(result.has_error(ErrorKind::RedirectLoopError));
}

#[tokio::test]
async fn test_cycle_between_two_hosts_stops_on_second_visit() {
    let mut a = Server::new_async().await;
    let mut b = Server::new_async().await;
    let a_url = format!("{}/", a.url());
    let b_url = format!("{}/", b.url());

    let a_mock = a
        .mock("GET", "/")
        .with_status(302)
        .with_header("location", &b_url)
        .expect(1)
        .create_async()
        .await;
    let b_mock = b
        .mock("GET", "/")
        .with_status(302)
        .with_header("location", &a_url)
        .expect(1)
        .create_async()
        .await;

    let result = execute(&a_url, &quick_config()).await;

    a_mock.assert_async().await;
    b_mock.assert_async().await;
    assert!(result.success);
    assert_eq!(result.redirects.len(), 2);
    assert_eq!(result.redirects[0].from, a_url);
    assert_eq!(result.redirects[0].to, b_url);
    assert_eq!(result.redirects[1].to, a_url);
    assert!(result.has_error(ErrorKind::RedirectLoopError));
    assert!(!result.has_error(ErrorKind::RedirectLimitExceeded));
}

#[tokio::test]
async fn test_missing_location_stops_traversal() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/gone")
        .with_status(302)
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/gone", server.url()), &quick_config()).await;

    mock.assert_async().await;
    assert!(result.success);
    assert!(result.redirects.is_empty());
    assert!(result.has_error(ErrorKind::ParseError));
    assert!(
        result
            .observations
            .contains(&"Total redirects followed: 0".to_string())
    );
}

#[tokio::test]
async fn test_meta_refresh_is_a_hop() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let _meta = server
        .mock("GET", "/meta")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(doc(
            r#"<meta http-equiv="refresh" content="0; url=/landing">"#,
            r#"<form action="/decoy"><input name="ignored"></form>"#,
        ))
        .create_async()
        .await;
    let landing = server
        .mock("GET", "/landing")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(doc(
            "",
            r#"<form method="post" action="/login"><input name="pw" type="password"></form>"#,
        ))
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/meta", base), &quick_config()).await;

    landing.assert_async().await;
    assert!(result.success);
    assert_eq!(result.redirects.len(), 1);
    assert_eq!(result.redirects[0].to, format!("{}/landing", base));
    assert_eq!(result.redirects[0].status, None);
    assert_eq!(result.redirects[0].reason.as_deref(), Some("meta refresh"));
    assert!(
        result
            .observations
            .contains(&"Meta refresh redirect to /landing".to_string())
    );

    // Forms come from the final page only
    assert_eq!(result.forms_found.len(), 1);
    assert_eq!(result.forms_found[0].action, format!("{}/login", base));
}

#[tokio::test]
async fn test_meta_refresh_to_itself_is_a_loop() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/stuck")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(doc(
            r#"<meta http-equiv="refresh" content="1;url=/stuck">"#,
            r#"<form action="/s"><input name="q"></form>"#,
        ))
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/stuck", server.url()), &quick_config()).await;

    mock.assert_async().await;
    assert!(result.success);
    assert_eq!(result.redirects.len(), 1);
    assert!(result.has_error(ErrorKind::RedirectLoopError));
    assert_eq!(result.forms_found.len(), 1);
}

#[tokio::test]
async fn test_meta_refresh_without_url_key() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let _start = server
        .mock("GET", "/start")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(doc(r#"<meta http-equiv="refresh" content="0; /landing">"#, ""))
        .create_async()
        .await;
    let landing = server
        .mock("GET", "/landing")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(doc("", "<p>Welcome</p>"))
        .expect(1)
        .create_async()
        .await;

    let result = execute(&format!("{}/start", base), &quick_config()).await;

    landing.assert_async().await;
    assert!(result.success);
    assert_eq!(result.redirects.len(), 1);
    assert_eq!(result.redirects[0].to, format!("{}/landing", base));
}
