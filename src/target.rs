use crate::errors::SandboxError;
use crate::filter::UrlScope;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static EMBEDDED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("embedded URL pattern is valid")
});

/// Characters that end a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// A resolved target plus what was learned while extracting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: Url,
    /// Number of URLs found when the target was free text (0 for a bare URL)
    pub urls_in_text: usize,
}

/// Resolve the user-submitted target to a single fetchable URL.
///
/// Bare URLs win. Scheme-less hosts (`www.example.com`, `example.com/path`)
/// get `http://`. Anything else is scanned for the first embedded URL.
pub fn extract(input: &str) -> Result<Target, SandboxError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SandboxError::TargetNotFound("target is empty".to_string()));
    }

    // A token that fails as a URL may still wrap one, as in `<https://...>`
    let bare_error = match parse_bare(trimmed) {
        Ok(Some(url)) => {
            ::log::debug!("Target is a bare URL: {}", url);
            return Ok(Target {
                url,
                urls_in_text: 0,
            });
        }
        Ok(None) => None,
        Err(e) => Some(e),
    };

    let candidates = find_urls(trimmed);
    ::log::debug!("Found {} URL candidates in target text", candidates.len());
    let urls_in_text = candidates.len();

    match candidates.into_iter().next() {
        Some(url) => Ok(Target { url, urls_in_text }),
        None => Err(bare_error.unwrap_or_else(|| {
            SandboxError::TargetNotFound("no URL found in submitted content".to_string())
        })),
    }
}

/// All well-formed http(s) URLs embedded in free text, in order of appearance
pub fn find_urls(text: &str) -> Vec<Url> {
    EMBEDDED_URL
        .find_iter(text)
        .map(|m| trim_trailing(m.as_str()))
        .filter_map(|candidate| Url::parse(candidate).ok())
        .filter(|url| UrlScope::is_fetchable(url))
        .collect()
}

/// Drop sentence punctuation after a URL, keeping a `)` only when it closes
/// a `(` inside the URL
fn trim_trailing(candidate: &str) -> &str {
    let mut end = candidate;
    loop {
        end = end.trim_end_matches(TRAILING_PUNCTUATION);
        match end.strip_suffix(')') {
            Some(rest) if end.matches(')').count() > end.matches('(').count() => end = rest,
            _ => return end,
        }
    }
}

/// Interpret a single-token target as a URL, repairing a missing scheme.
///
/// Returns `Ok(None)` when the input is not URL-shaped and should be
/// scanned as text instead.
fn parse_bare(input: &str) -> Result<Option<Url>, SandboxError> {
    if input.split_whitespace().count() != 1 {
        return Ok(None);
    }

    let candidate = if input.contains("://") {
        input.to_string()
    } else if input.starts_with("www.") || (input.contains('.') && !input.starts_with('/')) {
        format!("http://{}", input)
    } else {
        return Ok(None);
    };

    let url = Url::parse(&candidate).map_err(|e| {
        SandboxError::TargetNotFound(format!("malformed URL {:?}: {}", input, e))
    })?;

    if !UrlScope::is_fetchable(&url) {
        return Err(SandboxError::TargetNotFound(format!(
            "unsupported URL {:?}: only http and https with a host can be executed",
            input
        )));
    }

    Ok(Some(url))
}
