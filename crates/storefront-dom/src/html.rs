//! Tolerant HTML fragment parser and serializer.
//!
//! Covers what server-rendered product pages contain: nested elements,
//! quoted/unquoted/boolean attributes, void elements, comments, doctype,
//! raw-text `script`/`style` and the common character references.
//! Whitespace-only text runs are dropped.

use crate::fragment::{Fragment, FragmentNode};
use crate::DomError;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

struct OpenElement {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<FragmentNode>,
}

impl OpenElement {
    fn into_node(self) -> FragmentNode {
        FragmentNode::Element {
            tag: self.tag,
            attrs: self.attrs,
            children: self.children,
        }
    }
}

struct StartTag {
    tag: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    consumed: usize,
}

fn parse_err(offset: usize, reason: &str) -> DomError {
    DomError::Parse {
        offset,
        reason: reason.to_string(),
    }
}

fn push_node(stack: &mut [OpenElement], top: &mut Vec<FragmentNode>, node: FragmentNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn close_element(stack: &mut Vec<OpenElement>, top: &mut Vec<FragmentNode>, name: &str) {
    // Stray end tags are ignored, like a browser would.
    if !stack.iter().any(|open| open.tag == name) {
        return;
    }
    while let Some(open) = stack.pop() {
        let done = open.tag == name;
        let node = open.into_node();
        push_node(stack, top, node);
        if done {
            break;
        }
    }
}

/// Parse markup into a detached fragment.
pub(crate) fn parse(markup: &str) -> Result<Fragment, DomError> {
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut top: Vec<FragmentNode> = Vec::new();
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];

        if rest.starts_with("<!--") {
            let end = rest
                .find("-->")
                .ok_or_else(|| parse_err(pos, "unterminated comment"))?;
            pos += end + 3;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest
                .find('>')
                .ok_or_else(|| parse_err(pos, "unterminated declaration"))?;
            pos += end + 1;
            continue;
        }

        if rest.starts_with("</") {
            let end = rest
                .find('>')
                .ok_or_else(|| parse_err(pos, "unterminated end tag"))?;
            let name = rest[2..end].trim().to_ascii_lowercase();
            close_element(&mut stack, &mut top, &name);
            pos += end + 1;
            continue;
        }

        let opens_tag = rest.len() > 1
            && rest.as_bytes()[0] == b'<'
            && rest.as_bytes()[1].is_ascii_alphabetic();

        if opens_tag {
            let start = parse_start_tag(markup, pos)?;
            pos += start.consumed;

            if RAW_TEXT_TAGS.contains(&start.tag.as_str()) && !start.self_closing {
                let close = format!("</{}", start.tag);
                // ASCII lowercasing keeps byte offsets stable.
                let lowered = markup[pos..].to_ascii_lowercase();
                let end = lowered.find(&close).unwrap_or(lowered.len());
                let text = &markup[pos..pos + end];
                let mut children = Vec::new();
                if !text.is_empty() {
                    children.push(FragmentNode::Text(text.to_string()));
                }
                push_node(
                    &mut stack,
                    &mut top,
                    FragmentNode::Element {
                        tag: start.tag,
                        attrs: start.attrs,
                        children,
                    },
                );
                pos += end;
                if pos < markup.len() {
                    let close_end = markup[pos..]
                        .find('>')
                        .ok_or_else(|| parse_err(pos, "unterminated end tag"))?;
                    pos += close_end + 1;
                }
                continue;
            }

            if start.self_closing || is_void(&start.tag) {
                push_node(
                    &mut stack,
                    &mut top,
                    FragmentNode::Element {
                        tag: start.tag,
                        attrs: start.attrs,
                        children: Vec::new(),
                    },
                );
            } else {
                stack.push(OpenElement {
                    tag: start.tag,
                    attrs: start.attrs,
                    children: Vec::new(),
                });
            }
            continue;
        }

        let end = rest[1..].find('<').map(|i| i + 1).unwrap_or(rest.len());
        let raw = &rest[..end];
        if !raw.trim().is_empty() {
            push_node(&mut stack, &mut top, FragmentNode::Text(decode_entities(raw)));
        }
        pos += end;
    }

    while let Some(open) = stack.pop() {
        let node = open.into_node();
        push_node(&mut stack, &mut top, node);
    }

    Ok(Fragment { nodes: top })
}

fn parse_start_tag(markup: &str, start: usize) -> Result<StartTag, DomError> {
    let bytes = markup.as_bytes();
    let mut i = start + 1;

    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let tag = markup[name_start..i].to_ascii_lowercase();
    let mut attrs = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(parse_err(start, "unterminated start tag"));
        }
        match bytes[i] {
            b'>' => {
                return Ok(StartTag {
                    tag,
                    attrs,
                    self_closing: false,
                    consumed: i + 1 - start,
                });
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Ok(StartTag {
                    tag,
                    attrs,
                    self_closing: true,
                    consumed: i + 2 - start,
                });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = markup[attr_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(parse_err(start, "missing attribute value"));
            }
            let value = if bytes[i] == b'"' || bytes[i] == b'\'' {
                let quote = bytes[i] as char;
                let value_start = i + 1;
                let len = markup[value_start..]
                    .find(quote)
                    .ok_or_else(|| parse_err(attr_start, "unterminated attribute value"))?;
                i = value_start + len + 1;
                &markup[value_start..value_start + len]
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &markup[value_start..i]
            };
            attrs.push((name, decode_entities(value)));
        } else {
            attrs.push((name, String::new()));
        }
    }
}

/// Decode the character references server templates emit.
pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';').filter(|&s| s <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn write_open_tag(tag: &str, attrs: &[(String, String)], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
}

pub(crate) fn write_fragment_node(node: &FragmentNode, out: &mut String) {
    match node {
        FragmentNode::Text(text) => escape_text(text, out),
        FragmentNode::Element {
            tag,
            attrs,
            children,
        } => {
            write_open_tag(tag, attrs, out);
            if is_void(tag) {
                return;
            }
            for child in children {
                write_fragment_node(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_tags(fragment: &Fragment) -> Vec<&str> {
        fragment
            .nodes
            .iter()
            .filter_map(|n| match n {
                FragmentNode::Element { tag, .. } => Some(tag.as_str()),
                FragmentNode::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_nested_with_void() {
        let fragment = parse(
            r#"<form class="add-to-cart-form">
                <input type="hidden" name="csrfmiddlewaretoken" value="tok">
                <input type=number name=quantity value="1"/>
                <button class="add-to-cart-detail" data-product-id="7">Ajouter</button>
            </form>"#,
        )
        .unwrap();

        assert_eq!(element_tags(&fragment), vec!["form"]);
        let FragmentNode::Element { children, .. } = &fragment.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(children.len(), 3);
        let FragmentNode::Element { attrs, .. } = &children[1] else {
            panic!("expected element");
        };
        assert_eq!(attrs[0], ("type".to_string(), "number".to_string()));
        assert_eq!(attrs[2], ("value".to_string(), "1".to_string()));
    }

    #[test]
    fn test_skips_comments_and_doctype() {
        let fragment = parse("<!DOCTYPE html><!-- hi --><p>x</p>").unwrap();
        assert_eq!(element_tags(&fragment), vec!["p"]);
    }

    #[test]
    fn test_boolean_attribute() {
        let fragment = parse(r#"<input type="radio" checked>"#).unwrap();
        let FragmentNode::Element { attrs, .. } = &fragment.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(attrs[1], ("checked".to_string(), String::new()));
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let fragment = parse("<div>a</span>b</div>").unwrap();
        assert_eq!(fragment.to_html(), "<div>ab</div>");
    }

    #[test]
    fn test_unclosed_elements_are_closed_at_eof() {
        let fragment = parse("<div><span>x").unwrap();
        assert_eq!(fragment.to_html(), "<div><span>x</span></div>");
    }

    #[test]
    fn test_script_is_raw_text() {
        let fragment = parse("<script>if (a < b) {}</script><p>y</p>").unwrap();
        assert_eq!(element_tags(&fragment), vec!["script", "p"]);
    }

    #[test]
    fn test_unterminated_tag_is_error() {
        assert!(matches!(parse("<div class=\"x\""), Err(DomError::Parse { .. })));
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#233;&#x41;"), "a & b <c> éA");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_text_with_lone_angle_bracket() {
        let fragment = parse("<p>1 < 2</p>").unwrap();
        assert_eq!(fragment.to_html(), "<p>1 &lt; 2</p>");
    }
}
