//! `document.cookie` style cookie storage.

use std::fmt;

/// Cookies visible to the page, stored with their raw (encoded) values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    /// Empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `name=value; other=value` cookie string.
    ///
    /// Segments without `=` are ignored. Later duplicates do not shadow
    /// earlier ones, matching first-match lookup.
    pub fn parse(header: &str) -> Self {
        let entries = header
            .split(';')
            .filter_map(|segment| {
                let (name, value) = segment.trim().split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Set a cookie, percent-encoding the value.
    pub fn set(&mut self, name: &str, value: &str) {
        let encoded = percent_encode(value);
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = encoded,
            None => self.entries.push((name.to_string(), encoded)),
        }
    }

    /// Remove a cookie.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| k != name);
    }

    /// Look up a cookie by name and percent-decode its value.
    ///
    /// A value that is not valid percent-encoding is returned as stored.
    pub fn get(&self, name: &str) -> Option<String> {
        let (_, raw) = self.entries.iter().find(|(k, _)| k == name)?;
        Some(percent_decode(raw).unwrap_or_else(|| {
            tracing::debug!(cookie = name, "Cookie value is not valid percent-encoding");
            raw.clone()
        }))
    }

    /// Whether the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Encode like `encodeURIComponent`.
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        let unreserved = b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
        if unreserved {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Decode like `decodeURIComponent`; `None` on malformed input.
pub fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_get() {
        let jar = CookieJar::parse("sessionid=abc;  csrftoken=t%C3%A9st%3D ; theme=dark");
        assert_eq!(jar.get("csrftoken").as_deref(), Some("tést="));
        assert_eq!(jar.get("theme").as_deref(), Some("dark"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_name_prefix_does_not_match() {
        let jar = CookieJar::parse("csrftoken2=x");
        assert_eq!(jar.get("csrftoken"), None);
    }

    #[test]
    fn test_malformed_value_returned_raw() {
        let jar = CookieJar::parse("csrftoken=100%");
        assert_eq!(jar.get("csrftoken").as_deref(), Some("100%"));
    }

    #[test]
    fn test_signed_escape_is_malformed() {
        assert_eq!(percent_decode("%+1"), None);
        assert_eq!(percent_decode("%-1"), None);
        let jar = CookieJar::parse("csrftoken=a%+1");
        assert_eq!(jar.get("csrftoken").as_deref(), Some("a%+1"));
    }

    #[test]
    fn test_set_and_display() {
        let mut jar = CookieJar::new();
        jar.set("csrftoken", "a b");
        jar.set("lang", "fr");
        assert_eq!(jar.to_string(), "csrftoken=a%20b; lang=fr");
        jar.remove("csrftoken");
        assert_eq!(jar.to_string(), "lang=fr");
    }

    #[test]
    fn test_empty_string() {
        assert!(CookieJar::parse("").is_empty());
    }

    proptest! {
        #[test]
        fn set_then_get_returns_value(value in "\\PC{0,32}") {
            let mut jar = CookieJar::new();
            jar.set("csrftoken", &value);
            prop_assert_eq!(jar.get("csrftoken"), Some(value));
        }
    }
}
