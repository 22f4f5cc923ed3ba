//! Locating the inline client-state script in a product page.
use crate::scan::{assigned_object_start, balanced_object, token_positions};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector"));

/// Text of the first `<script>` block, in document order, that mentions
/// `marker` as a whole token.
pub fn find_state_script(html: &str, marker: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&SCRIPT)
        .map(|el| el.text().collect::<String>())
        .find(|text| token_positions(text, marker).next().is_some())
}

/// The object literal assigned to `marker` inside `script`.
///
/// Occurrences that are reads (`if (window.__INITIAL_STATE__)`) or
/// comparisons are skipped; the first real assignment wins.
pub fn assigned_object<'a>(script: &'a str, marker: &str) -> Result<&'a str, PayloadIssue> {
    let start = token_positions(script, marker)
        .find_map(|pos| assigned_object_start(script, pos + marker.len()))
        .ok_or(PayloadIssue::NoAssignment)?;
    balanced_object(script, start).ok_or(PayloadIssue::Unterminated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadIssue {
    NoAssignment,
    Unterminated,
}

impl PayloadIssue {
    pub fn describe(&self) -> &'static str {
        match self {
            PayloadIssue::NoAssignment => "no object literal is assigned to the state marker",
            PayloadIssue::Unterminated => "state object literal is never closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: &str = "window.__INITIAL_STATE__";

    #[test]
    fn picks_first_script_with_marker() {
        let html = r#"<html><head>
            <script>var analytics = {};</script>
            <script>window.__INITIAL_STATE__ = {"n": 1};</script>
            <script>window.__INITIAL_STATE__ = {"n": 2};</script>
        </head></html>"#;
        let text = find_state_script(html, M).unwrap();
        assert!(text.contains(r#"{"n": 1}"#));
    }

    #[test]
    fn marker_in_visible_text_is_ignored() {
        let html = "<body><p>window.__INITIAL_STATE__ = {}</p><script>var a = 1;</script></body>";
        assert_eq!(find_state_script(html, M), None);
    }

    #[test]
    fn skips_guard_reads_before_assignment() {
        let script = r#"if (!window.__INITIAL_STATE__) { window.__INITIAL_STATE__ = {"a": "x;y"}; }"#;
        assert_eq!(assigned_object(script, M), Ok(r#"{"a": "x;y"}"#));
    }

    #[test]
    fn reports_missing_assignment_and_unterminated_objects() {
        assert_eq!(
            assigned_object("console.log(window.__INITIAL_STATE__);", M),
            Err(PayloadIssue::NoAssignment)
        );
        assert_eq!(
            assigned_object(r#"window.__INITIAL_STATE__ = {"a": {"b": 1};"#, M),
            Err(PayloadIssue::Unterminated)
        );
    }
}
