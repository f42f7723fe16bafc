use crate::config::SandboxConfig;
use crate::errors::SandboxError;
use crate::filter::UrlScope;
use crate::heuristics;
use crate::parsers::{ContentKind, HtmlField, HtmlForm, html};
use crate::results::SandboxResult;
use crate::runners::fetch;
use reqwest::Client;
use tokio::time::Instant;
use url::Url;

const PLACEHOLDER_EMAIL: &str = "sandbox_test_user@example.invalid";
const PLACEHOLDER_PASSWORD: &str = "FakePassword123!";
const PLACEHOLDER_CARD: &str = "4111111111111111";
const PLACEHOLDER_CVV: &str = "123";
const PLACEHOLDER_PHONE: &str = "+1-555-0100";

/// Submit the page's only form once with placeholder values, if it is a GET form.
///
/// Outcomes land in `result`; nothing here can fail the run.
pub async fn probe_forms(
    client: &Client,
    forms: &[HtmlForm],
    page_url: &Url,
    config: &SandboxConfig,
    deadline: Option<Instant>,
    result: &mut SandboxResult,
) {
    let [form] = forms else {
        result.record_action(format!(
            "Skipped form probe: {} forms found, exactly one required",
            forms.len()
        ));
        return;
    };

    if form.method != "GET" {
        result.record_action(format!(
            "Skipped form probe: form method is {}",
            form.method
        ));
        return;
    }

    let url = match probe_url(form) {
        Ok(url) => url,
        Err(e) => {
            result.record_action("Form probe failed");
            result.record_error(e);
            return;
        }
    };

    let Some(budget) = fetch::hop_budget(config, deadline) else {
        result.record_action("Form probe failed");
        result.record_error(SandboxError::FormProbe {
            url: url.to_string(),
            message: "overall time budget exhausted".to_string(),
        });
        return;
    };

    let page = match fetch::fetch(client, &url, budget, config.max_body_bytes).await {
        Ok(page) => page,
        Err(e) => {
            result.record_action("Form probe failed");
            result.record_error(SandboxError::FormProbe {
                url: url.to_string(),
                message: e.to_string(),
            });
            return;
        }
    };

    result.record_action(format!("Probed form at {} (GET)", url));
    result.record_observation(format!(
        "Form probe returned HTTP status {}",
        page.status.as_u16()
    ));

    if page.is_redirect() {
        if let Ok(to) = page.redirect_target() {
            result.record_observation(format!("Form probe redirected to {}", to));
            if UrlScope::new(page_url).is_off_domain(&to) {
                result.record_observation(format!(
                    "Form probe redirected to a different domain: {}",
                    to.host_str().unwrap_or_default()
                ));
            }
        }
    }

    if config.extended_heuristics
        && ContentKind::from_content_type(page.content_type.as_deref(), &page.body).is_html()
        && heuristics::looks_accepted(&html::parse(&page.body, &page.url).text)
    {
        result.record_observation("Form probe response suggests the submission was accepted");
    }
}

/// The form's action with placeholder values as its query string
fn probe_url(form: &HtmlForm) -> Result<Url, SandboxError> {
    let mut url = Url::parse(&form.action).map_err(|e| SandboxError::FormProbe {
        url: form.action.clone(),
        message: format!("unparseable action: {}", e),
    })?;

    if !UrlScope::is_fetchable(&url) {
        return Err(SandboxError::FormProbe {
            url: form.action.clone(),
            message: "action is not an http(s) URL".to_string(),
        });
    }

    let values = placeholder_values(form);
    url.set_fragment(None);
    if values.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(values);
    }

    Ok(url)
}

/// Placeholder submission values, in field order. Unnamed fields, unchecked
/// boxes and plain buttons are left out, as a browser would.
pub fn placeholder_values(form: &HtmlForm) -> Vec<(String, String)> {
    form.fields
        .iter()
        .filter_map(|field| {
            let name = field.name.clone()?;
            placeholder_for(field, &name).map(|value| (name, value))
        })
        .collect()
}

fn placeholder_for(field: &HtmlField, name: &str) -> Option<String> {
    let lowered = name.to_ascii_lowercase();
    let has = |hints: &[&str]| hints.iter().any(|h| lowered.contains(h));

    let value = match field.field_type.as_str() {
        "submit" => return field.value.clone(),
        "button" | "reset" | "image" | "file" => return None,
        "hidden" => return Some(field.value.clone().unwrap_or_default()),
        "checkbox" | "radio" => {
            return field
                .checked
                .then(|| field.value.clone().unwrap_or_else(|| "on".to_string()));
        }
        "password" => PLACEHOLDER_PASSWORD.to_string(),
        "email" => PLACEHOLDER_EMAIL.to_string(),
        "tel" => PLACEHOLDER_PHONE.to_string(),
        _ if has(&["email", "username", "user", "login"]) => PLACEHOLDER_EMAIL.to_string(),
        _ if has(&["password", "pwd", "pass"]) => PLACEHOLDER_PASSWORD.to_string(),
        _ if has(&["cvv", "cvc"]) => PLACEHOLDER_CVV.to_string(),
        _ if has(&["card", "credit"]) => PLACEHOLDER_CARD.to_string(),
        _ if has(&["phone", "mobile", "tel"]) => PLACEHOLDER_PHONE.to_string(),
        _ => format!("test_{}", name),
    };

    Some(value)
}
