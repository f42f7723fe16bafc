pub mod html;


use crate::results::{FieldRecord, FormRecord};
use std::collections::BTreeSet;

/// How a fetched body should be treated, based on its content-type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// HTML or XHTML document
    Html,
    /// Plain text or other textual formats
    Text,
    /// Anything else (images, archives, executables, ...)
    Other,
}

impl ContentKind {
    /// Classify a response from its Content-Type header, sniffing the body
    /// when the header is missing
    pub fn from_content_type(content_type: Option<&str>, body: &str) -> Self {
        let Some(content_type) = content_type else {
            return Self::sniff(body);
        };

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "text/html" || mime == "application/xhtml+xml" {
            ::log::debug!("Classifying as Html: {}", content_type);
            ContentKind::Html
        } else if mime.starts_with("text/") || mime == "application/json" || mime.ends_with("+xml")
        {
            ::log::debug!("Classifying as Text: {}", content_type);
            ContentKind::Text
        } else if mime.is_empty() {
            Self::sniff(body)
        } else {
            ::log::debug!("Classifying as Other: {}", content_type);
            ContentKind::Other
        }
    }

    fn sniff(body: &str) -> Self {
        let head: String = body
            .trim_start()
            .chars()
            .take(64)
            .collect::<String>()
            .to_ascii_lowercase();
        if head.starts_with("<!doctype html") || head.starts_with("<html") {
            ::log::debug!("Sniffed untyped body as Html");
            ContentKind::Html
        } else {
            ContentKind::Other
        }
    }

    /// Returns if forms and links should be extracted
    pub fn is_html(&self) -> bool {
        matches!(self, ContentKind::Html)
    }
}

/// A form input as found in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlField {
    pub name: Option<String>,
    pub field_type: String,
    pub required: bool,
    /// Preset `value` attribute, used for hidden and checkable fields
    pub value: Option<String>,
    pub checked: bool,
}

/// A form element with its action resolved against the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlForm {
    pub method: String,
    pub action: String,
    pub fields: Vec<HtmlField>,
}

impl HtmlForm {
    /// Identity used to drop duplicate forms: method, action and field names
    pub fn dedup_key(&self) -> (String, String, BTreeSet<String>) {
        let names = self
            .fields
            .iter()
            .filter_map(|f| f.name.clone())
            .collect();
        (self.method.clone(), self.action.clone(), names)
    }

    pub fn has_password_field(&self) -> bool {
        self.fields.iter().any(|f| f.field_type == "password")
    }

    pub fn to_record(&self) -> FormRecord {
        FormRecord {
            method: self.method.clone(),
            action: self.action.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| FieldRecord {
                    name: f.name.clone(),
                    field_type: f.field_type.clone(),
                    required: f.required,
                })
                .collect(),
        }
    }
}

/// Everything the sandbox needs from one HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Forms in document order, duplicates removed
    pub forms: Vec<HtmlForm>,
    /// Raw `src` values of script tags
    pub scripts: Vec<String>,
    /// Raw target of a `<meta http-equiv="refresh">`, if any
    pub meta_refresh: Option<String>,
    /// Raw `href` values of anchors
    pub links: Vec<String>,
    /// Whitespace-normalized body text
    pub text: String,
    /// Number of elements carrying inline `on*` event handlers
    pub inline_handlers: usize,
    /// Number of complaints the HTML parser raised while recovering
    pub markup_errors: usize,
}
