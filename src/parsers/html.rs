use crate::parsers::{HtmlField, HtmlForm, ParsedPage};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static FORM: LazyLock<Selector> = LazyLock::new(|| selector("form"));
static FIELD: LazyLock<Selector> = LazyLock::new(|| selector("input, textarea, select"));
static SCRIPT: LazyLock<Selector> = LazyLock::new(|| selector("script[src]"));
static META_EQUIV: LazyLock<Selector> = LazyLock::new(|| selector("meta[http-equiv]"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static ANY: LazyLock<Selector> = LazyLock::new(|| selector("*"));

/// Parses an HTML document fetched from `page_url`
pub fn parse(html: &str, page_url: &Url) -> ParsedPage {
    let doc = Html::parse_document(html);

    let forms = extract_forms(&doc, page_url);

    let scripts = doc
        .select(&SCRIPT)
        .filter_map(|e| e.value().attr("src"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<String>>();

    let meta_refresh = doc
        .select(&META_EQUIV)
        .filter(|e| {
            e.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })
        .find_map(|e| e.value().attr("content").and_then(parse_refresh_content));

    let links = doc
        .select(&LINK)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    let text = doc
        .select(&BODY)
        .flat_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let inline_handlers = doc
        .select(&ANY)
        .filter(|e| e.value().attrs().any(|(name, _)| is_event_handler(name)))
        .count();

    ::log::debug!(
        "HTML parser found {} forms, {} scripts, {} links",
        forms.len(),
        scripts.len(),
        links.len()
    );

    ParsedPage {
        forms,
        scripts,
        meta_refresh,
        links,
        text,
        inline_handlers,
        markup_errors: structural_errors(&doc),
    }
}

/// Parser complaints about the page structure.
///
/// Doctype complaints are left out. A missing or legacy doctype only switches
/// the parser into quirks mode.
fn structural_errors(doc: &Html) -> usize {
    let bad_doctype = doc
        .errors
        .iter()
        .filter(|e| e.starts_with("Bad DOCTYPE"))
        .count();
    // Without a doctype the first token is reported as unexpected
    let missing_doctype = usize::from(!doc.tree.root().children().any(|n| n.value().is_doctype()));

    doc.errors.len().saturating_sub(bad_doctype + missing_doctype)
}

/// Extract forms in document order, keeping the first of any duplicates
fn extract_forms(doc: &Html, page_url: &Url) -> Vec<HtmlForm> {
    let mut seen = HashSet::new();
    let mut forms = Vec::new();

    for element in doc.select(&FORM) {
        let form = extract_form(element, page_url);
        if seen.insert(form.dedup_key()) {
            forms.push(form);
        } else {
            ::log::debug!("Skipping duplicate form {} {}", form.method, form.action);
        }
    }

    forms
}

fn extract_form(element: ElementRef<'_>, page_url: &Url) -> HtmlForm {
    let attrs = element.value();

    let method = attrs
        .attr("method")
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "GET".to_string());

    let action = match attrs.attr("action").map(str::trim).filter(|a| !a.is_empty()) {
        Some(raw) => page_url
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => page_url.to_string(),
    };

    let fields = element.select(&FIELD).map(extract_field).collect();

    HtmlForm {
        method,
        action,
        fields,
    }
}

fn extract_field(element: ElementRef<'_>) -> HtmlField {
    let attrs = element.value();

    let field_type = match attrs.name() {
        "textarea" => "textarea".to_string(),
        "select" => "select".to_string(),
        _ => attrs
            .attr("type")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "text".to_string()),
    };

    HtmlField {
        name: attrs
            .attr("name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        field_type,
        required: attrs.attr("required").is_some(),
        value: attrs.attr("value").map(str::to_string),
        checked: attrs.attr("checked").is_some(),
    }
}

fn is_event_handler(attr_name: &str) -> bool {
    attr_name.len() > 2 && attr_name.starts_with("on")
}

/// Pull the target out of a refresh directive such as `5; URL='/next'` or `0; /next`
pub fn parse_refresh_content(content: &str) -> Option<String> {
    let (_, directive) = content.split_once([';', ','])?;
    let directive = directive.trim();

    // The `url=` key is optional
    let value = directive
        .get(..3)
        .filter(|key| key.eq_ignore_ascii_case("url"))
        .and_then(|_| directive[3..].trim_start().strip_prefix('='))
        .unwrap_or(directive);

    let target = value.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}
