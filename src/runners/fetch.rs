use crate::config::SandboxConfig;
use crate::errors::SandboxError;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, LOCATION};
use reqwest::{Client, StatusCode, redirect};
use std::time::Duration;
use tokio::time::{Instant, timeout};
use url::Url;

/// One completed hop
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status: StatusCode,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
    /// Body exceeded `max_body_bytes` and was cut
    pub truncated: bool,
    /// Headers arrived but the body could not be read
    pub body_error: Option<String>,
}

impl FetchedPage {
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection() && self.status != StatusCode::NOT_MODIFIED
    }

    /// Resolve the Location header against this page's URL
    pub fn redirect_target(&self) -> Result<Url, SandboxError> {
        let raw = self.location.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(SandboxError::Parse(format!(
                "redirect from {} has no Location header",
                self.url
            )));
        }

        self.url.join(raw).map_err(|e| {
            SandboxError::Parse(format!(
                "redirect from {} has unparseable Location {:?}: {}",
                self.url, raw, e
            ))
        })
    }
}

/// Build the client for a single run. Redirects are never followed by the
/// transport; the hop loop does that itself.
pub fn build_client(config: &SandboxConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .redirect(redirect::Policy::none())
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.timeout_per_hop())
        .build()
}

/// Time allowed for the next request, or None if the overall budget is spent
pub fn hop_budget(config: &SandboxConfig, deadline: Option<Instant>) -> Option<Duration> {
    let per_hop = config.timeout_per_hop();
    match deadline {
        None => Some(per_hop),
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                None
            } else {
                Some(per_hop.min(remaining))
            }
        }
    }
}

/// GET `url` once, without following redirects, within `budget`
pub async fn fetch(
    client: &Client,
    url: &Url,
    budget: Duration,
    max_body_bytes: usize,
) -> Result<FetchedPage, SandboxError> {
    ::log::debug!("GET {} (budget {} ms)", url, budget.as_millis());
    let started = Instant::now();

    let outcome = timeout(budget, async {
        let response = client.get(url.clone()).send().await?;
        Ok::<_, reqwest::Error>(read_page(url, response, max_body_bytes).await)
    })
    .await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(Ok(page)) => {
            ::log::info!("{} {} in {} ms", page.status.as_u16(), url, elapsed_ms);
            Ok(page)
        }
        Ok(Err(e)) => Err(SandboxError::from_reqwest(url.as_str(), &e, elapsed_ms)),
        Err(_) => Err(SandboxError::Timeout {
            url: url.to_string(),
            elapsed_ms,
        }),
    }
}

async fn read_page(
    url: &Url,
    mut response: reqwest::Response,
    max_body_bytes: usize,
) -> FetchedPage {
    let status = response.status();
    let location = header_value(response.headers(), LOCATION);
    let content_type = header_value(response.headers(), CONTENT_TYPE);

    let mut bytes = Vec::new();
    let mut truncated = false;
    let mut body_error = None;

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = max_body_bytes.saturating_sub(bytes.len());
                if chunk.len() > room {
                    bytes.extend_from_slice(&chunk[..room]);
                    truncated = true;
                    break;
                }
                bytes.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                body_error = Some(e.to_string());
                break;
            }
        }
    }

    FetchedPage {
        url: url.clone(),
        status,
        location,
        content_type,
        body: String::from_utf8_lossy(&bytes).into_owned(),
        truncated,
        body_error,
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
