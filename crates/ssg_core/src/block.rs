//! Liquid template blocks derived from the rendered shell.
//!
//! A block is the shell's styles, the shell's scripts rewritten to `asset_url`
//! lookups and the server-rendered container, dropped into a caller supplied
//! skeleton at the `{%html%}` and `{%script%}` slots.

use crate::assets::{asset_path, rewrite_asset_tag};
use crate::html::{TagNode, TagTree};
use crate::inject::render_container;

/// Slot replaced by the server-rendered container.
pub const HTML_SLOT: &str = "{%html%}";
/// Slot replaced by the rewritten script tags.
pub const SCRIPT_SLOT: &str = "{%script%}";
/// Opt-out attribute honoured in [`ExtractionMode::Unfiltered`].
pub const IGNORE_ATTR: &str = "ignore";

/// Which `script`/`style`/`link` tags are copied into the block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Every tag except those carrying the `ignore` attribute.
    #[default]
    Unfiltered,
    /// `script`/`link` tags whose `src`/`href` contains one of the substrings,
    /// plus every `style` tag.
    Filtered(Vec<String>),
}

impl ExtractionMode {
    pub fn from_filter(filter: Option<&[String]>) -> Self {
        match filter {
            Some(filters) => Self::Filtered(filters.to_vec()),
            None => Self::Unfiltered,
        }
    }

    pub fn accepts(&self, node: &TagNode) -> bool {
        match self {
            Self::Unfiltered => accepts_unfiltered(node),
            Self::Filtered(filters) => accepts_filtered(node, filters),
        }
    }
}

fn is_block_tag(node: &TagNode) -> bool {
    matches!(node.name.as_str(), "script" | "style" | "link")
}

pub fn accepts_unfiltered(node: &TagNode) -> bool {
    is_block_tag(node) && !node.has_attribute(IGNORE_ATTR)
}

pub fn accepts_filtered(node: &TagNode, filters: &[String]) -> bool {
    match node.name.as_str() {
        "style" => true,
        "script" | "link" => asset_path(&node.attributes)
            .is_some_and(|path| filters.iter().any(|filter| path.contains(filter.as_str()))),
        _ => false,
    }
}

/// Result of [`compose`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateBlock {
    pub fragment: String,
    /// Script files referenced through `asset_url`, in document order.
    pub referenced_files: Vec<String>,
    /// Stylesheet files referenced through `asset_url`, in document order.
    pub stylesheet_files: Vec<String>,
}

impl TemplateBlock {
    /// Every referenced file, scripts first.
    pub fn all_files(&self) -> impl Iterator<Item = &str> {
        self.referenced_files
            .iter()
            .chain(self.stylesheet_files.iter())
            .map(String::as_str)
    }
}

/// Build a template block from `shell` and the server-rendered `markup`.
pub fn compose(
    shell: &str,
    markup: &str,
    skeleton: &str,
    container_id: &str,
    extras: Option<&str>,
    mode: &ExtractionMode,
) -> TemplateBlock {
    let tree = TagTree::parse(shell);
    let mut style_output = String::new();
    let mut script_output = String::new();
    let mut block = TemplateBlock::default();

    for node in tree.walk().filter(|node| mode.accepts(node)) {
        match node.name.as_str() {
            // newest first
            "style" => style_output = format!("{}\n{style_output}", node.source(shell)),
            "link" => {
                if let Some((tag, record)) = rewrite_asset_tag(node) {
                    style_output.push_str(&tag);
                    block.stylesheet_files.push(record.filename);
                }
            }
            "script" => {
                if let Some((tag, record)) = rewrite_asset_tag(node) {
                    script_output.push_str(&tag);
                    block.referenced_files.push(record.filename);
                }
            }
            _ => {}
        }
    }

    let container = render_container(container_id, markup, extras.unwrap_or_default());
    let body = fill_slots(
        skeleton,
        &[(HTML_SLOT, container.as_str()), (SCRIPT_SLOT, script_output.as_str())],
    );

    block.fragment = style_output + &body;
    block
}

/// Substitute the first occurrence of each marker in `skeleton`.
///
/// Positions are taken from the skeleton itself, so a value containing another
/// marker is never substituted again.
pub fn fill_slots(skeleton: &str, slots: &[(&str, &str)]) -> String {
    let mut hits: Vec<(usize, &str, &str)> = slots
        .iter()
        .filter_map(|(marker, value)| skeleton.find(marker).map(|pos| (pos, *marker, *value)))
        .collect();
    hits.sort_by_key(|(pos, ..)| *pos);

    let mut out = String::with_capacity(skeleton.len());
    let mut cursor = 0;
    for (pos, marker, value) in hits {
        if pos < cursor {
            continue;
        }
        out.push_str(&skeleton[cursor..pos]);
        out.push_str(value);
        cursor = pos + marker.len();
    }
    out.push_str(&skeleton[cursor..]);
    out
}
