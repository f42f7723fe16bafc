use url::Url;

/// Site scope of a page: decides which URLs are "off-domain" relative to it
/// and how URLs are compared when detecting redirect cycles.
#[derive(Debug, Clone)]
pub struct UrlScope {
    /// Host of the page, lower-cased with any leading `www.` removed
    site: Option<String>,
}

impl UrlScope {
    /// Create a scope anchored at the given page URL
    pub fn new(page_url: &Url) -> Self {
        Self {
            site: page_url.host_str().map(site_key),
        }
    }

    /// Only http(s) URLs with a host are ever fetched
    pub fn is_fetchable(url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    }

    /// Check if a URL points at a different site than the page.
    ///
    /// URLs without a host (`javascript:`, `data:`, `mailto:`) are not
    /// considered off-domain.
    pub fn is_off_domain(&self, url: &Url) -> bool {
        match (self.site.as_deref(), url.host_str()) {
            (Some(site), Some(host)) => site != site_key(host),
            _ => false,
        }
    }

    /// Resolve `reference` against `base` and report the host if it is off-domain
    pub fn off_domain_host(&self, base: &Url, reference: &str) -> Option<String> {
        let resolved = base.join(reference.trim()).ok()?;
        if self.is_off_domain(&resolved) {
            resolved.host_str().map(|h| h.to_ascii_lowercase())
        } else {
            None
        }
    }

    /// Create a normalized version of the URL for visit tracking (fragment removed)
    pub fn normalize_url(url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}

fn site_key(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
