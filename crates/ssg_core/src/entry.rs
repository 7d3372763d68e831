//! Entry detection and script tag rewriting on the shell document.

use std::sync::LazyLock;

use regex::Regex;

use crate::options::ScriptMode;

/// Entry used when the shell has no module script.
pub const DEFAULT_ENTRY: &str = "src/main.js";

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>\s*</script>").expect("valid regex"));
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\ssrc=["']([^"']+)["']"#).expect("valid regex"));
static TYPE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\stype=(?:'|")?([^>'"\s]+)"#).expect("valid regex"));

/// `src` of the first empty `<script type="module" src=...>` tag in `html`.
pub fn detect_entry(html: &str) -> Option<String> {
    SCRIPT_TAG.captures_iter(html).find_map(|captures| {
        let attrs = captures.get(1)?.as_str();
        let script_type = TYPE_ATTR.captures(attrs)?.get(1)?.as_str();
        if script_type != "module" {
            return None;
        }
        SRC_ATTR
            .captures(attrs)
            .and_then(|src| src.get(1))
            .map(|src| src.as_str().to_string())
    })
}

/// [`detect_entry`] falling back to [`DEFAULT_ENTRY`].
pub fn detect_entry_or_default(html: &str) -> String {
    detect_entry(html).unwrap_or_else(|| DEFAULT_ENTRY.to_string())
}

/// Add the loading-mode attribute to every `<script type="module" ...>` tag.
pub fn rewrite_scripts(html: &str, mode: ScriptMode) -> String {
    match mode.attribute() {
        None => html.to_string(),
        Some(attr) => html.replace(
            "<script type=\"module\" ",
            &format!("<script type=\"module\" {attr} "),
        ),
    }
}
