//! Observation heuristics over the final page.
//!
//! The baseline set is always applied. The extended set is the keyword
//! scanning the reporting pipeline historically did; it is noisier and only
//! runs when `extended_heuristics` is enabled.

use crate::filter::UrlScope;
use crate::parsers::ParsedPage;
use std::collections::BTreeSet;
use url::Url;

const CARD_HINTS: &[&str] = &["card", "cvv", "cvc", "ccnum", "expiry"];
const BANKING_HINTS: &[&str] = &["routing", "iban", "sort_code", "bank", "account_number"];
const ACCEPTANCE_HINTS: &[&str] = &["success", "thank you", "welcome", "logged in"];

/// Baseline observations for a parsed final page
pub fn observe_page(page: &ParsedPage, page_url: &Url, scope: &UrlScope) -> Vec<String> {
    let mut observations = Vec::new();

    if page.forms.iter().any(|f| f.has_password_field()) {
        observations.push("Page requests credentials (password field present)".to_string());
    }

    let form_hosts: BTreeSet<String> = page
        .forms
        .iter()
        .filter_map(|f| scope.off_domain_host(page_url, &f.action))
        .collect();
    for host in form_hosts {
        observations.push(format!("Form submits to a different domain: {}", host));
    }

    // Keep document order for scripts, one entry per host
    let mut script_hosts = Vec::new();
    for src in &page.scripts {
        if let Some(host) = scope.off_domain_host(page_url, src) {
            if !script_hosts.contains(&host) {
                script_hosts.push(host);
            }
        }
    }
    for host in script_hosts {
        observations.push(format!("External script loaded from {}", host));
    }

    observations
}

/// Keyword heuristics over field names and scripting
pub fn observe_page_extended(page: &ParsedPage) -> Vec<String> {
    let mut observations = Vec::new();

    let names: Vec<String> = page
        .forms
        .iter()
        .flat_map(|f| f.fields.iter())
        .filter_map(|f| f.name.as_deref())
        .map(str::to_ascii_lowercase)
        .collect();

    if names.iter().any(|n| contains_any(n, CARD_HINTS)) {
        observations.push("Payment card field detected".to_string());
    }
    if names.iter().any(|n| contains_any(n, BANKING_HINTS)) {
        observations.push("Banking information field detected".to_string());
    }

    let script_links = page
        .links
        .iter()
        .filter(|href| href.trim_start().to_ascii_lowercase().starts_with("javascript:"))
        .count();
    if script_links > 0 || page.inline_handlers > 0 {
        observations.push(format!(
            "Suspicious JavaScript detected ({} javascript: links, {} inline event handlers)",
            script_links, page.inline_handlers
        ));
    }

    observations
}

/// Whether a form probe response reads like the submission was accepted
pub fn looks_accepted(response_text: &str) -> bool {
    let lowered = response_text.to_lowercase();
    contains_any(&lowered, ACCEPTANCE_HINTS)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
