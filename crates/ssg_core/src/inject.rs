//! Splicing server-rendered markup into the shell document.

use crate::error::{Result, SsgCoreError};
use crate::html::{Attribute, TagNode, TagTree};

/// Marker attribute the client checks before hydrating.
pub const SERVER_RENDERED_ATTR: &str = "data-server-rendered";

/// Replace the container element of `shell` with a server-rendered equivalent.
///
/// The literal empty container `<div id="{container_id}"></div>` is tried first
/// with a single textual replacement. Otherwise the shell is scanned and the
/// first element whose `id` equals `container_id` is rebuilt from its own
/// attributes plus the marker, with `markup` as its only content. `extras`
/// (e.g. a serialized-state script) follows the closing tag in both paths.
pub fn inject(shell: &str, container_id: &str, markup: &str, extras: Option<&str>) -> Result<String> {
    let extras = extras.unwrap_or_default();

    let empty = empty_container(container_id);
    if let Some(pos) = shell.find(&empty) {
        let block = render_container(container_id, markup, extras);
        let mut out = String::with_capacity(shell.len() + block.len());
        out.push_str(&shell[..pos]);
        out.push_str(&block);
        out.push_str(&shell[pos + empty.len()..]);
        return Ok(out);
    }

    let tree = TagTree::parse(shell);
    let node = tree
        .find_first(|node| is_container(node, container_id))
        .ok_or_else(|| SsgCoreError::InjectionTargetNotFound {
            container_id: container_id.to_string(),
        })?;

    Ok(splice_container(shell, node, markup, extras))
}

/// `<div id="{container_id}"></div>`
pub fn empty_container(container_id: &str) -> String {
    format!("<div id=\"{container_id}\"></div>")
}

/// Container block used by the fast path and by template blocks.
pub fn render_container(container_id: &str, markup: &str, extras: &str) -> String {
    format!("<div id=\"{container_id}\" {SERVER_RENDERED_ATTR}=\"true\">{markup}</div>{extras}")
}

/// Whether `node` carries `id == container_id`.
pub fn is_container(node: &TagNode, container_id: &str) -> bool {
    node.attributes
        .iter()
        .any(|attr| attr.is("id") && attr.value() == Some(container_id))
}

/// Opening tag rebuilt from the node's attributes in source order, plus the marker.
pub fn reconstruct_open_tag(node: &TagNode) -> String {
    let mut parts: Vec<String> = node
        .attributes
        .iter()
        .filter(|attr| !attr.is(SERVER_RENDERED_ATTR))
        .map(Attribute::to_source)
        .collect();
    parts.push(format!("{SERVER_RENDERED_ATTR}=\"true\""));
    format!("<{} {}>", node.name, parts.join(" "))
}

fn splice_container(shell: &str, node: &TagNode, markup: &str, extras: &str) -> String {
    let before = &shell[..node.start];
    let after = &shell[node.end..];
    let open = reconstruct_open_tag(node);

    let mut out = String::with_capacity(shell.len() + markup.len() + extras.len() + 32);
    out.push_str(before);
    out.push_str(&open);
    out.push_str(markup);
    out.push_str("</");
    out.push_str(&node.name);
    out.push('>');
    out.push_str(extras);
    out.push_str(after);
    out
}

/// `<script>window.__INITIAL_STATE__=...</script>` for an already serialized state.
///
/// `</` is escaped so the payload cannot terminate the script element.
pub fn state_script(serialized_state: &str) -> String {
    let escaped = serialized_state.replace("</", "<\\/");
    format!("<script>window.__INITIAL_STATE__={escaped}</script>")
}
