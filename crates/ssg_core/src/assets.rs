//! Rewriting asset references into Liquid `asset_url` lookups.

use crate::html::{Attribute, TagNode};

/// A file referenced by a `src` or `href` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    /// `src` or `href`, as written.
    pub attr_name: String,
    /// File base name, directories stripped.
    pub filename: String,
}

fn is_asset_attr(attr: &Attribute) -> bool {
    attr.is("src") || attr.is("href")
}

/// Raw `src`/`href` value of the first asset attribute, if it has one.
pub fn asset_path(attributes: &[Attribute]) -> Option<&str> {
    attributes
        .iter()
        .find(|attr| is_asset_attr(attr))
        .and_then(Attribute::value)
        .filter(|value| !value.is_empty())
}

/// Locate the asset reference among `attributes`.
pub fn find_asset_ref(attributes: &[Attribute]) -> Option<AssetRecord> {
    let attr = attributes.iter().find(|attr| is_asset_attr(attr))?;
    let path = attr.value().filter(|value| !value.is_empty())?;
    let filename = base_name(path);
    if filename.is_empty() {
        return None;
    }
    Some(AssetRecord {
        attr_name: attr.name.clone(),
        filename: filename.to_string(),
    })
}

/// Every attribute except `src`/`href`, in encounter order.
///
/// Valued attributes render as `name="value"`, valueless ones as bare `name`.
pub fn stringify_other_attributes(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .filter(|attr| !is_asset_attr(attr))
        .map(|attr| match attr.value() {
            Some(value) => format!("{}=\"{value}\"", attr.name),
            None => attr.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `{{ 'app.js' | asset_url }}`
pub fn asset_lookup(filename: &str) -> String {
    format!("{{{{ '{filename}' | asset_url }}}}")
}

/// Rebuild `node` with its asset path replaced by a Liquid lookup.
///
/// Returns `None` when the node has no resolvable `src`/`href`.
pub fn rewrite_asset_tag(node: &TagNode) -> Option<(String, AssetRecord)> {
    let record = find_asset_ref(&node.attributes)?;
    let others = stringify_other_attributes(&node.attributes);
    let reference = format!("{}=\"{}\"", record.attr_name, asset_lookup(&record.filename));
    let attrs = if others.is_empty() {
        reference
    } else {
        format!("{others} {reference}")
    };
    Some((format!("<{name} {attrs}></{name}>\n", name = node.name), record))
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::TagTree;

    fn first(html: &str) -> TagNode {
        TagTree::parse(html).roots.remove(0)
    }

    #[test]
    fn test_find_asset_ref_strips_directories() {
        let node = first(r#"<script type="module" src="/assets/app.abc123.js"></script>"#);
        let record = find_asset_ref(&node.attributes).unwrap();
        assert_eq!(record.attr_name, "src");
        assert_eq!(record.filename, "app.abc123.js");
    }

    #[test]
    fn test_find_asset_ref_uses_href() {
        let node = first(r#"<link rel="stylesheet" href="assets/app.css">"#);
        let record = find_asset_ref(&node.attributes).unwrap();
        assert_eq!(record.attr_name, "href");
        assert_eq!(record.filename, "app.css");
    }

    #[test]
    fn test_find_asset_ref_none_without_value() {
        assert!(find_asset_ref(&first("<script>inline()</script>").attributes).is_none());
        assert!(find_asset_ref(&first(r#"<script src=""></script>"#).attributes).is_none());
        assert!(find_asset_ref(&first("<script src></script>").attributes).is_none());
    }

    #[test]
    fn test_stringify_other_attributes_keeps_order() {
        let node = first(r#"<script type="module" crossorigin src="/a.js" data-x='1'></script>"#);
        assert_eq!(
            stringify_other_attributes(&node.attributes),
            r#"type="module" crossorigin data-x="1""#
        );
    }

    #[test]
    fn test_rewrite_asset_tag() {
        let node = first(r#"<script type="module" crossorigin src="/assets/index-4f2a.js"></script>"#);
        let (tag, record) = rewrite_asset_tag(&node).unwrap();
        assert_eq!(
            tag,
            "<script type=\"module\" crossorigin src=\"{{ 'index-4f2a.js' | asset_url }}\"></script>\n"
        );
        assert_eq!(record.filename, "index-4f2a.js");
    }

    #[test]
    fn test_rewrite_asset_tag_without_other_attributes() {
        let node = first(r#"<link href="/a.css">"#);
        let (tag, _) = rewrite_asset_tag(&node).unwrap();
        assert_eq!(tag, "<link href=\"{{ 'a.css' | asset_url }}\"></link>\n");
    }

    #[test]
    fn test_asset_path_returns_raw_value() {
        let node = first(r#"<link rel="stylesheet" href="/assets/vendor.css">"#);
        assert_eq!(asset_path(&node.attributes), Some("/assets/vendor.css"));
    }
}
