//! Minimal HTML tag scanner.
//!
//! Builds a tree of [`TagNode`]s that remember the byte offsets of their source
//! text. Nothing here re-serializes markup: callers locate a node and splice new
//! strings around `node.start` / `node.end`.
//!
//! The scanner is forgiving in the way browsers are for the subset that matters
//! to shell documents: comments and doctypes are skipped, `script`/`style`
//! bodies are raw text, void elements never take children, stray closing tags
//! are ignored and unclosed elements run to the end of their parent.

/// How an attribute value was quoted in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    Unquoted,
}

/// An attribute value together with its original quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    pub value: String,
    pub quote: Quote,
}

/// A single attribute on an opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as written in the source.
    pub name: String,
    /// `None` for valueless attributes such as `defer`.
    pub value: Option<AttributeValue>,
    /// Byte offset where the attribute name starts.
    pub start: usize,
    /// Byte offset one past the end of the attribute (including closing quote).
    pub end: usize,
}

impl Attribute {
    /// Attribute value without quotes.
    pub fn value(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.value.as_str())
    }

    /// Whether the attribute name matches (ASCII case-insensitive).
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Render the attribute back to its original textual form.
    pub fn to_source(&self) -> String {
        match &self.value {
            None => self.name.clone(),
            Some(AttributeValue {
                value,
                quote: Quote::Double,
            }) => format!("{}=\"{value}\"", self.name),
            Some(AttributeValue {
                value,
                quote: Quote::Single,
            }) => format!("{}='{value}'", self.name),
            Some(AttributeValue {
                value,
                quote: Quote::Unquoted,
            }) => format!("{}={value}", self.name),
        }
    }
}

/// An element found while scanning a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    /// Lowercased tag name.
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Byte offset of the opening `<`.
    pub start: usize,
    /// Byte offset one past the `>` of the opening tag.
    pub open_end: usize,
    /// Byte offset one past the end of the element (closing tag included).
    pub end: usize,
    pub children: Vec<TagNode>,
}

impl TagNode {
    /// First attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.is(name))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Original source text of the whole element.
    pub fn source<'a>(&self, html: &'a str) -> &'a str {
        &html[self.start..self.end]
    }
}

/// Parsed document: the top-level nodes in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTree {
    pub roots: Vec<TagNode>,
}

impl TagTree {
    /// Scan `html` into a tag tree.
    pub fn parse(html: &str) -> Self {
        Parser::new(html).run()
    }

    /// Depth-first, pre-order walk over every node.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// First node (in walk order) matching `predicate`.
    pub fn find_first<F>(&self, predicate: F) -> Option<&TagNode>
    where
        F: Fn(&TagNode) -> bool,
    {
        self.walk().find(|node| predicate(node))
    }
}

/// Pre-order iterator returned by [`TagTree::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a TagNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TagNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

struct Parser<'a> {
    html: &'a str,
    bytes: &'a [u8],
    pos: usize,
    open: Vec<TagNode>,
    roots: Vec<TagNode>,
}

impl<'a> Parser<'a> {
    fn new(html: &'a str) -> Self {
        Self {
            html,
            bytes: html.as_bytes(),
            pos: 0,
            open: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn run(mut self) -> TagTree {
        while let Some(offset) = self.html[self.pos..].find('<') {
            let lt = self.pos + offset;
            let rest = &self.html[lt..];

            if rest.starts_with("<!--") {
                self.pos = self.skip_past(lt + 4, "-->");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos = self.skip_past(lt + 2, ">");
            } else if rest.starts_with("</") {
                self.closing_tag(lt);
            } else if self.bytes.get(lt + 1).is_some_and(u8::is_ascii_alphabetic) {
                self.opening_tag(lt);
            } else {
                self.pos = lt + 1;
            }
        }

        let len = self.html.len();
        while let Some(mut node) = self.open.pop() {
            node.end = len;
            self.attach(node);
        }

        TagTree { roots: self.roots }
    }

    /// Offset one past the next `needle` at or after `from`, or end of input.
    fn skip_past(&self, from: usize, needle: &str) -> usize {
        match self.html.get(from..).and_then(|s| s.find(needle)) {
            Some(i) => from + i + needle.len(),
            None => self.html.len(),
        }
    }

    fn scan_name(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.bytes.len()
            && !self.bytes[i].is_ascii_whitespace()
            && self.bytes[i] != b'/'
            && self.bytes[i] != b'>'
        {
            i += 1;
        }
        i
    }

    fn attach(&mut self, node: TagNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn closing_tag(&mut self, lt: usize) {
        let name_end = self.scan_name(lt + 2);
        if name_end == lt + 2 {
            self.pos = lt + 2;
            return;
        }
        let name = self.html[lt + 2..name_end].to_ascii_lowercase();
        let end = self.skip_past(name_end, ">");
        self.pos = end;

        let Some(index) = self.open.iter().rposition(|node| node.name == name) else {
            return;
        };

        // Elements left open inside the one being closed end where the closing tag starts.
        while self.open.len() > index + 1 {
            if let Some(mut child) = self.open.pop() {
                child.end = lt;
                self.attach(child);
            }
        }
        if let Some(mut node) = self.open.pop() {
            node.end = end;
            self.attach(node);
        }
    }

    fn opening_tag(&mut self, lt: usize) {
        let name_end = self.scan_name(lt + 1);
        let name = self.html[lt + 1..name_end].to_ascii_lowercase();
        let (attributes, open_end, self_closing) = self.attributes(name_end);

        let mut node = TagNode {
            name,
            attributes,
            start: lt,
            open_end,
            end: open_end,
            children: Vec::new(),
        };

        if self_closing || VOID_ELEMENTS.contains(&node.name.as_str()) {
            self.pos = open_end;
            self.attach(node);
        } else if RAW_TEXT_ELEMENTS.contains(&node.name.as_str()) {
            node.end = self.raw_text_end(open_end, &node.name);
            self.pos = node.end;
            self.attach(node);
        } else {
            self.pos = open_end;
            self.open.push(node);
        }
    }

    /// End of a raw-text element: one past its closing tag, or end of input.
    fn raw_text_end(&self, from: usize, name: &str) -> usize {
        let needle = format!("</{name}");
        let haystack = self.html[from..].to_ascii_lowercase();
        match haystack.find(&needle) {
            Some(i) => self.skip_past(from + i + needle.len(), ">"),
            None => self.html.len(),
        }
    }

    /// Parse attributes starting at `from`.
    ///
    /// Returns the attributes, the offset one past the opening tag and whether
    /// the tag was self-closing (`/>`).
    fn attributes(&self, from: usize) -> (Vec<Attribute>, usize, bool) {
        let bytes = self.bytes;
        let len = bytes.len();
        let mut attributes = Vec::new();
        let mut i = from;

        loop {
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len {
                return (attributes, len, false);
            }
            match bytes[i] {
                b'>' => return (attributes, i + 1, false),
                b'/' if bytes.get(i + 1) == Some(&b'>') => return (attributes, i + 2, true),
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let start = i;
            while i < len
                && !bytes[i].is_ascii_whitespace()
                && bytes[i] != b'='
                && bytes[i] != b'>'
                && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
            {
                i += 1;
            }
            if i == start {
                // stray `=`
                i += 1;
                continue;
            }
            let name = self.html[start..i].to_string();
            let name_end = i;

            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len || bytes[i] != b'=' {
                attributes.push(Attribute {
                    name,
                    value: None,
                    start,
                    end: name_end,
                });
                i = name_end;
                continue;
            }

            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let value = match bytes.get(i) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let value_start = i + 1;
                    let (value, next) = match self.html[value_start..].find(q as char) {
                        Some(off) => (
                            &self.html[value_start..value_start + off],
                            value_start + off + 1,
                        ),
                        None => (&self.html[value_start..], len),
                    };
                    i = next;
                    AttributeValue {
                        value: value.to_string(),
                        quote: if q == b'"' { Quote::Double } else { Quote::Single },
                    }
                }
                _ => {
                    let value_start = i;
                    while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    AttributeValue {
                        value: self.html[value_start..i].to_string(),
                        quote: Quote::Unquoted,
                    }
                }
            };

            attributes.push(Attribute {
                name,
                value: Some(value),
                start,
                end: i,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tree: &TagTree) -> Vec<&str> {
        tree.walk().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_parse_nested_elements_in_preorder() {
        let html = "<html><head><title>x</title></head><body><div><p>hi</p></div></body></html>";
        let tree = TagTree::parse(html);
        assert_eq!(
            names(&tree),
            vec!["html", "head", "title", "body", "div", "p"]
        );
    }

    #[test]
    fn test_offsets_cover_whole_element() {
        let html = r#"<body><div id="app" class="x"><span>a</span></div></body>"#;
        let tree = TagTree::parse(html);
        let div = tree.find_first(|n| n.name == "div").unwrap();
        assert_eq!(
            div.source(html),
            r#"<div id="app" class="x"><span>a</span></div>"#
        );
        assert_eq!(&html[div.start..div.open_end], r#"<div id="app" class="x">"#);
    }

    #[test]
    fn test_attribute_quoting_is_recorded() {
        let html = r#"<input a="1" b='2' c=3 d>"#;
        let tree = TagTree::parse(html);
        let input = &tree.roots[0];
        let sources: Vec<String> = input.attributes.iter().map(Attribute::to_source).collect();
        assert_eq!(sources, vec![r#"a="1""#, "b='2'", "c=3", "d"]);
        assert_eq!(input.attribute("c").and_then(Attribute::value), Some("3"));
        assert_eq!(input.attribute("d").and_then(Attribute::value), None);
    }

    #[test]
    fn test_void_and_self_closing_elements_have_no_children() {
        let html = r#"<head><meta charset="utf-8"><link rel="icon" href="/a.ico"><br/><p>x</p></head>"#;
        let tree = TagTree::parse(html);
        let head = &tree.roots[0];
        let children: Vec<&str> = head.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(children, vec!["meta", "link", "br", "p"]);
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let html = r#"<body><script>const s = "<div id='app'></div>";</script><div id="app"></div></body>"#;
        let tree = TagTree::parse(html);
        let divs: Vec<&TagNode> = tree.walk().filter(|n| n.name == "div").collect();
        assert_eq!(divs.len(), 1);
        let script = tree.find_first(|n| n.name == "script").unwrap();
        assert!(script.source(html).ends_with("</script>"));
        assert!(script.children.is_empty());
    }

    #[test]
    fn test_comments_and_doctype_are_skipped() {
        let html = "<!DOCTYPE html><!-- <div id=\"app\"></div> --><main></main>";
        let tree = TagTree::parse(html);
        assert_eq!(names(&tree), vec!["main"]);
    }

    #[test]
    fn test_unclosed_elements_run_to_end() {
        let html = "<body><div><p>text";
        let tree = TagTree::parse(html);
        let p = tree.find_first(|n| n.name == "p").unwrap();
        assert_eq!(p.end, html.len());
        assert_eq!(tree.roots[0].end, html.len());
    }

    #[test]
    fn test_implicitly_closed_children_end_at_parent_close() {
        let html = "<div><p>one</div><span></span>";
        let tree = TagTree::parse(html);
        let div = &tree.roots[0];
        assert_eq!(div.source(html), "<div><p>one</div>");
        assert_eq!(div.children[0].source(html), "<p>one");
        assert_eq!(tree.roots[1].name, "span");
    }

    #[test]
    fn test_stray_closing_tag_is_ignored() {
        let html = "</p><div></div>";
        let tree = TagTree::parse(html);
        assert_eq!(names(&tree), vec!["div"]);
    }

    #[test]
    fn test_tag_names_are_lowercased_and_utf8_is_preserved() {
        let html = "<DIV ID=\"app\">héllo ✓</DIV>";
        let tree = TagTree::parse(html);
        let div = &tree.roots[0];
        assert_eq!(div.name, "div");
        assert_eq!(div.attribute("id").and_then(Attribute::value), Some("app"));
        assert_eq!(div.source(html), html);
    }
}
