use crate::config::SandboxConfig;
use tokio::net::TcpListener;

mod failure_tests;
mod redirect_tests;

/// Short per-hop timeout so failing tests fail fast
fn quick_config() -> SandboxConfig {
    SandboxConfig {
        timeout_per_hop_ms: 2_000,
        ..SandboxConfig::default()
    }
}

/// A well-formed HTML document
fn doc(head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Test</title>{}</head><body>{}</body></html>",
        head, body
    )
}

/// Base URL of a port nothing listens on
async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Base URL of a server that accepts connections and never answers
async fn silent_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}
