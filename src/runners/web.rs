use crate::config::SandboxConfig;
use crate::errors::SandboxError;
use crate::filter::UrlScope;
use crate::heuristics;
use crate::parsers::{ContentKind, ParsedPage, html};
use crate::results::{RedirectRecord, SandboxResult};
use crate::runners::fetch::{self, FetchedPage};
use crate::runners::probe;
use crate::target;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use tokio::time::Instant;
use url::Url;

/// Executes a target in the sandbox and returns everything observed.
///
/// Never fails: problems end up in the result's `errors`, and `success` is
/// false only when no page could be reached at all.
///
/// # Arguments
///
/// * `target` - A URL, or free text containing one
/// * `config` - Sandbox configuration
pub async fn execute(target: &str, config: &SandboxConfig) -> SandboxResult {
    ::log::info!("Starting sandbox run for target: {}", preview(target));

    let target = match target::extract(target) {
        Ok(target) => target,
        Err(e) => return SandboxResult::failed(e),
    };
    let start_url = target.url;

    // A fresh client per run keeps connection state out of other runs
    let client = match fetch::build_client(config) {
        Ok(client) => client,
        Err(e) => {
            return SandboxResult::failed(SandboxError::Fetch {
                url: start_url.to_string(),
                message: format!("could not build HTTP client: {}", e),
            });
        }
    };

    let mut run = Traversal::new(config, client, &start_url);
    if target.urls_in_text > 1 {
        run.result.record_observation(format!(
            "Found {} URLs in submitted content; executing the first",
            target.urls_in_text
        ));
    }
    run.result.record_action(format!("Validated target URL: {}", start_url));

    match run.traverse(start_url).await {
        Some(final_page) => run.finish(final_page).await,
        None => run.into_failed(),
    }
}

/// A fetched page that may turn out to be the final one
struct Candidate {
    page: FetchedPage,
    parsed: Option<ParsedPage>,
}

enum Hop {
    Http(StatusCode),
    MetaRefresh,
}

/// State for a single run
struct Traversal<'a> {
    config: &'a SandboxConfig,
    client: Client,
    deadline: Option<Instant>,
    visited: HashSet<Url>,
    result: SandboxResult,
}

impl<'a> Traversal<'a> {
    fn new(config: &'a SandboxConfig, client: Client, start_url: &Url) -> Self {
        let mut visited = HashSet::new();
        visited.insert(UrlScope::normalize_url(start_url));

        Self {
            config,
            client,
            deadline: config.overall_timeout().map(|budget| Instant::now() + budget),
            visited,
            result: SandboxResult::started(),
        }
    }

    /// Follow the hop chain from `start`.
    ///
    /// Returns the page to treat as final, or None if the very first hop
    /// failed.
    async fn traverse(&mut self, start: Url) -> Option<Candidate> {
        let mut current = start;
        let mut last: Option<Candidate> = None;

        loop {
            let Some(budget) = fetch::hop_budget(self.config, self.deadline) else {
                self.result.record_action(format!(
                    "Overall time budget exhausted before fetching {}",
                    current
                ));
                self.result.record_error(SandboxError::Timeout {
                    url: current.to_string(),
                    elapsed_ms: self.config.overall_timeout_ms.unwrap_or_default(),
                });
                return last;
            };

            let page = match fetch::fetch(
                &self.client,
                &current,
                budget,
                self.config.max_body_bytes,
            )
            .await
            {
                Ok(page) => page,
                Err(e) => {
                    self.result.record_action(format!("Failed to fetch URL: {}", current));
                    self.result.record_error(e);
                    return last;
                }
            };

            self.result.record_action(format!("Fetched URL: {}", page.url));
            self.result.record_observation(format!(
                "HTTP status {} from {}",
                page.status.as_u16(),
                page.url
            ));

            if page.is_redirect() {
                let next = match page.redirect_target() {
                    Ok(next) => next,
                    Err(e) => {
                        self.result.record_error(e);
                        return Some(Candidate { page, parsed: None });
                    }
                };
                let from = page.url.clone();
                let followed = self.follow(&from, next, Hop::Http(page.status));
                last = Some(Candidate { page, parsed: None });
                match followed {
                    Some(next) => current = next,
                    None => return last,
                }
                continue;
            }

            let parsed = parse_if_html(&page);
            let refresh = parsed.as_ref().and_then(|p| p.meta_refresh.clone());
            let candidate = Candidate { page, parsed };

            let Some(raw) = refresh else {
                return Some(candidate);
            };

            self.result.record_observation(format!("Meta refresh redirect to {}", raw));
            let from = candidate.page.url.clone();
            let next = match from.join(&raw) {
                Ok(next) => next,
                Err(e) => {
                    self.result.record_error(SandboxError::Parse(format!(
                        "meta refresh on {} has unparseable target {:?}: {}",
                        from, raw, e
                    )));
                    return Some(candidate);
                }
            };

            match self.follow(&from, next, Hop::MetaRefresh) {
                Some(next) => {
                    current = next;
                    last = Some(candidate);
                }
                None => return Some(candidate),
            }
        }
    }

    /// Record a hop from `from` to `to` and decide whether to take it
    fn follow(&mut self, from: &Url, to: Url, hop: Hop) -> Option<Url> {
        if !UrlScope::is_fetchable(&to) {
            self.result.record_error(SandboxError::Parse(format!(
                "redirect from {} points to unsupported URL {}",
                from, to
            )));
            return None;
        }

        if self.result.redirects.len() >= self.config.max_redirects {
            self.result.record_error(SandboxError::RedirectLimitExceeded {
                limit: self.config.max_redirects,
                url: from.to_string(),
            });
            return None;
        }

        let (status, reason, verb) = match hop {
            Hop::Http(status) => (
                Some(status.as_u16().to_string()),
                status.canonical_reason().map(str::to_string),
                "redirect",
            ),
            Hop::MetaRefresh => (None, Some("meta refresh".to_string()), "meta refresh"),
        };

        self.result.redirects.push(RedirectRecord {
            from: from.to_string(),
            to: to.to_string(),
            status,
            reason,
        });

        if UrlScope::new(from).is_off_domain(&to) {
            self.result.record_observation(format!(
                "Redirect crosses to a different domain: {}",
                to.host_str().unwrap_or_default()
            ));
        }

        if !self.visited.insert(UrlScope::normalize_url(&to)) {
            self.result.record_error(SandboxError::RedirectLoop { url: to.to_string() });
            return None;
        }

        ::log::debug!("Following {} {} -> {}", verb, from, to);
        self.result.record_action(format!("Followed {} to {}", verb, to));
        Some(to)
    }

    /// Parse and inspect the final page, run the optional probe and seal the result
    async fn finish(mut self, candidate: Candidate) -> SandboxResult {
        let Candidate { page, parsed } = candidate;

        if let Some(message) = &page.body_error {
            self.result.record_error(SandboxError::Parse(format!(
                "could not read body of {}: {}",
                page.url, message
            )));
        }
        if page.truncated {
            self.result.record_observation(format!(
                "Response body truncated at {} bytes",
                self.config.max_body_bytes
            ));
        }

        let parsed = parsed.or_else(|| parse_if_html(&page));
        match parsed {
            Some(parsed) => {
                self.inspect(&page, &parsed);
                if self.config.follow_forms {
                    probe::probe_forms(
                        &self.client,
                        &parsed.forms,
                        &page.url,
                        self.config,
                        self.deadline,
                        &mut self.result,
                    )
                    .await;
                }
            }
            None => {
                self.result.record_observation(format!(
                    "Response is not HTML (Content-Type: {})",
                    page.content_type.as_deref().unwrap_or("unknown")
                ));
            }
        }

        self.result.record_observation(format!(
            "Total redirects followed: {}",
            self.result.redirects.len()
        ));
        ::log::info!(
            "Sandbox run finished: {} actions, {} redirects, {} forms, {} errors",
            self.result.actions_taken.len(),
            self.result.redirects.len(),
            self.result.forms_found.len(),
            self.result.errors.len()
        );
        self.result
    }

    fn inspect(&mut self, page: &FetchedPage, parsed: &ParsedPage) {
        if parsed.markup_errors > 0 {
            self.result.record_error(SandboxError::Parse(format!(
                "recovered from {} markup errors in {}",
                parsed.markup_errors, page.url
            )));
        }

        for form in &parsed.forms {
            self.result.record_action(format!("Found form with {} fields", form.fields.len()));
            self.result.forms_found.push(form.to_record());
        }
        self.result.record_action(format!(
            "Parsed {} forms and {} links",
            parsed.forms.len(),
            parsed.links.len()
        ));

        let scope = UrlScope::new(&page.url);
        for observation in heuristics::observe_page(parsed, &page.url, &scope) {
            self.result.record_observation(observation);
        }
        if self.config.extended_heuristics {
            for observation in heuristics::observe_page_extended(parsed) {
                self.result.record_observation(observation);
            }
        }
    }

    fn into_failed(mut self) -> SandboxResult {
        self.result.success = false;
        self.result
    }
}

fn parse_if_html(page: &FetchedPage) -> Option<ParsedPage> {
    ContentKind::from_content_type(page.content_type.as_deref(), &page.body)
        .is_html()
        .then(|| html::parse(&page.body, &page.url))
}

/// Shorten free-text targets for log lines
fn preview(target: &str) -> String {
    let mut preview: String = target.trim().chars().take(120).collect();
    if target.trim().chars().count() > 120 {
        preview.push_str("...");
    }
    preview
}
