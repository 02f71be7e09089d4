//! Selector subset used by page controllers.
//!
//! Supported: type (`input`), universal (`*`), id (`#imageModal`), class
//! (`.thumbnail`), attribute presence and equality (`[data-product-id]`,
//! `input[name="quantity"]`), descendant (`A B`) and child (`A > B`)
//! combinators. Selector lists and pseudo-classes are not supported.

use std::fmt;
use std::str::FromStr;

use crate::node::ElementData;
use crate::DomError;

/// An attribute condition inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[name]`
    Exists(String),
    /// `[name=value]`
    Equals(String, String),
}

/// One compound selector, e.g. `button.add-to-cart-detail[data-product-id]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrMatch>,
}

impl Compound {
    /// Whether an element satisfies every condition.
    pub fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != el.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|m| match m {
            AttrMatch::Exists(name) => el.attr(name).is_some(),
            AttrMatch::Equals(name, value) => el.attr(name) == Some(value.as_str()),
        })
    }
}

/// Relationship between a compound and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A parsed selector: compounds left to right, each (after the first)
/// carrying the combinator that links it to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    pub(crate) parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(source: &str) -> Result<Self, DomError> {
        Parser::new(source).parse()
    }

    /// Selector matching elements carrying `id`.
    pub fn id(id: &str) -> Self {
        Self {
            source: format!("#{}", id),
            parts: vec![(
                Combinator::Descendant,
                Compound {
                    id: Some(id.to_string()),
                    ..Default::default()
                },
            )],
        }
    }

    /// Selector matching elements carrying `class`.
    pub fn class(class: &str) -> Self {
        Self {
            source: format!(".{}", class),
            parts: vec![(
                Combinator::Descendant,
                Compound {
                    classes: vec![class.to_string()],
                    ..Default::default()
                },
            )],
        }
    }

    /// Selector matching elements by tag name.
    pub fn tag(tag: &str) -> Self {
        Self {
            source: tag.to_string(),
            parts: vec![(
                Combinator::Descendant,
                Compound {
                    tag: Some(tag.to_ascii_lowercase()),
                    ..Default::default()
                },
            )],
        }
    }

    /// Original selector text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The rightmost compound (the subject of the selector).
    pub fn subject(&self) -> &Compound {
        // `parse` rejects empty selectors.
        &self.parts[self.parts.len() - 1].1
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, reason: &str) -> DomError {
        DomError::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.to_string(),
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<&'a str, DomError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.source[start..self.pos])
    }

    fn parse(mut self) -> Result<Selector, DomError> {
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;

        self.skip_ws();
        loop {
            let compound = self.compound()?;
            parts.push((combinator, compound));

            let had_ws = self.skip_ws();
            if self.pos >= self.bytes.len() {
                break;
            }
            combinator = if self.bytes[self.pos] == b'>' {
                self.pos += 1;
                self.skip_ws();
                Combinator::Child
            } else if had_ws {
                Combinator::Descendant
            } else {
                return Err(self.error("unexpected character"));
            };
        }

        Ok(Selector {
            source: self.source.trim().to_string(),
            parts,
        })
    }

    fn compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        let start = self.pos;

        if self.pos < self.bytes.len() && self.bytes[self.pos] == b'*' {
            self.pos += 1;
        } else if self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'#' => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?.to_string());
                }
                b'.' => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?.to_string());
                }
                b'[' => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrMatch, DomError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();

        let Some(&next) = self.bytes.get(self.pos) else {
            return Err(self.error("unterminated attribute selector"));
        };
        if next == b']' {
            self.pos += 1;
            return Ok(AttrMatch::Exists(name));
        }
        if next != b'=' {
            return Err(self.error("expected '=' or ']'"));
        }
        self.pos += 1;
        self.skip_ws();

        let value = match self.bytes.get(self.pos).copied() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                let len = self.source[start..]
                    .find(quote as char)
                    .ok_or_else(|| self.error("unterminated string"))?;
                self.pos = start + len + 1;
                self.source[start..start + len].to_string()
            }
            Some(_) => self.ident()?.to_string(),
            None => return Err(self.error("missing attribute value")),
        };

        self.skip_ws();
        if self.bytes.get(self.pos) != Some(&b']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;
        Ok(AttrMatch::Equals(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse(r#"input[name="quantity"]"#).unwrap();
        assert_eq!(sel.parts.len(), 1);
        let subject = sel.subject();
        assert_eq!(subject.tag.as_deref(), Some("input"));
        assert_eq!(
            subject.attrs,
            vec![AttrMatch::Equals("name".into(), "quantity".into())]
        );
    }

    #[test]
    fn test_parse_descendant_and_child() {
        let sel = Selector::parse("#productCarousel-7 .thumbnail").unwrap();
        assert_eq!(sel.parts.len(), 2);
        assert_eq!(sel.parts[0].1.id.as_deref(), Some("productCarousel-7"));
        assert_eq!(sel.parts[1].0, Combinator::Descendant);

        let sel = Selector::parse(".rating-star > i").unwrap();
        assert_eq!(sel.parts[1].0, Combinator::Child);
        assert_eq!(sel.parts[1].1.tag.as_deref(), Some("i"));
    }

    #[test]
    fn test_matches() {
        let mut el = ElementData::new("button");
        el.set_attr("class", "btn add-to-cart-detail");
        el.set_attr("data-product-id", "7");

        assert!(Selector::parse(".add-to-cart-detail[data-product-id]")
            .unwrap()
            .subject()
            .matches(&el));
        assert!(Selector::parse("button[data-product-id=7]")
            .unwrap()
            .subject()
            .matches(&el));
        assert!(!Selector::parse("button[data-product-id='8']")
            .unwrap()
            .subject()
            .matches(&el));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse(".").is_err());
        assert!(Selector::parse("a[b").is_err());
        assert!(Selector::parse("a:hover").is_err());
    }

    proptest! {
        #[test]
        fn class_selector_roundtrips(class in "[a-z][a-z0-9-]{0,15}") {
            let sel = Selector::parse(&format!(".{}", class)).unwrap();
            prop_assert_eq!(&sel.subject().classes, &vec![class]);
        }

        #[test]
        fn parse_never_panics(input in "\\PC{0,24}") {
            let _ = Selector::parse(&input);
        }
    }
}
