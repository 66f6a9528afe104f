//! Content resolution: pick one rendered representation out of a result
//! envelope.
//!
//! A completed conversion returns an envelope that may carry the document in
//! several renderings at once. The resolver picks the best one in a fixed
//! priority order — markdown, then plain text, then HTML — and otherwise
//! hands back the whole envelope untouched. Resolution looks only at what
//! the server actually returned; it does not consult the `output_format`
//! that was requested at submission time.

use serde_json::Value;

/// The single representation chosen from a result envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedContent {
    Markdown(String),
    Text(String),
    Html(String),
    /// The envelope had no usable `document` rendering; returned unchanged.
    Raw(Value),
}

impl ResolvedContent {
    /// Short label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedContent::Markdown(_) => "markdown",
            ResolvedContent::Text(_) => "text",
            ResolvedContent::Html(_) => "html",
            ResolvedContent::Raw(_) => "raw",
        }
    }

    /// The chosen content as a string: rendered documents verbatim, raw
    /// envelopes as pretty-printed JSON.
    pub fn render(&self) -> String {
        match self {
            ResolvedContent::Markdown(s)
            | ResolvedContent::Text(s)
            | ResolvedContent::Html(s) => s.clone(),
            ResolvedContent::Raw(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

/// Fields of `document`, in resolution priority order.
const PRIORITY: [(&str, fn(String) -> ResolvedContent); 3] = [
    ("md_content", ResolvedContent::Markdown),
    ("text_content", ResolvedContent::Text),
    ("html_content", ResolvedContent::Html),
];

/// Resolve a result envelope to its best available representation.
///
/// Returns the first non-empty of `document.md_content`,
/// `document.text_content`, `document.html_content`; if `document` is absent
/// or carries none of them, the full envelope comes back as
/// [`ResolvedContent::Raw`].
pub fn resolve_content(envelope: &Value) -> ResolvedContent {
    if let Some(document) = envelope.get("document") {
        for (field, wrap) in PRIORITY {
            if let Some(s) = document.get(field).and_then(Value::as_str) {
                if !s.is_empty() {
                    return wrap(s.to_string());
                }
            }
        }
    }
    ResolvedContent::Raw(envelope.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn markdown_beats_text() {
        let envelope = json!({"document": {"md_content": "X", "text_content": "Y"}});
        assert_eq!(
            resolve_content(&envelope),
            ResolvedContent::Markdown("X".into())
        );
    }

    #[test]
    fn text_when_markdown_absent() {
        let envelope = json!({"document": {"text_content": "Y"}});
        assert_eq!(resolve_content(&envelope), ResolvedContent::Text("Y".into()));
    }

    #[test]
    fn html_is_the_last_rendering_tried() {
        let envelope = json!({"document": {"md_content": "", "html_content": "<p>Z</p>"}});
        assert_eq!(
            resolve_content(&envelope),
            ResolvedContent::Html("<p>Z</p>".into())
        );
    }

    #[test]
    fn empty_document_returns_full_envelope() {
        let envelope = json!({"document": {}, "status": "success"});
        assert_eq!(
            resolve_content(&envelope),
            ResolvedContent::Raw(envelope.clone())
        );
    }

    #[test]
    fn missing_document_returns_full_envelope() {
        let envelope = json!({"outputs": [1, 2, 3]});
        assert_eq!(
            resolve_content(&envelope),
            ResolvedContent::Raw(envelope.clone())
        );
    }

    #[test]
    fn empty_strings_do_not_count_as_content() {
        let envelope = json!({"document": {"md_content": "", "text_content": "", "html_content": ""}});
        assert_eq!(
            resolve_content(&envelope),
            ResolvedContent::Raw(envelope.clone())
        );
    }

    #[test]
    fn render_pretty_prints_raw_envelopes() {
        let envelope = json!({"a": 1});
        let rendered = resolve_content(&envelope).render();
        assert!(rendered.contains("\"a\": 1"));
    }

    #[test]
    fn render_passes_document_content_through() {
        let envelope = json!({"document": {"md_content": "# Title\n"}});
        assert_eq!(resolve_content(&envelope).render(), "# Title\n");
    }
}
