use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static ATTR_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML attribute escaper")
});

const ATTR_REPLACEMENTS: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];

/// Escape a value for use inside a double- or single-quoted XML attribute.
///
/// # Examples
///
/// ```
/// use litchi_stream::common::xml::escape_attr;
/// assert_eq!(escape_attr("a & b"), "a &amp; b");
/// assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
/// ```
#[inline]
pub fn escape_attr(s: &str) -> String {
    ATTR_ESCAPER.replace_all(s, &ATTR_REPLACEMENTS)
}

/// Escape an attribute value straight into an output stream.
///
/// Avoids the intermediate `String` when the value has nothing to escape,
/// which is the common case for URLs.
pub fn write_escaped_attr<W: std::io::Write + ?Sized>(out: &mut W, s: &str) -> std::io::Result<()> {
    if !ATTR_ESCAPER.is_match(s) {
        return out.write_all(s.as_bytes());
    }
    let mut last = 0;
    for m in ATTR_ESCAPER.find_iter(s) {
        out.write_all(&s.as_bytes()[last..m.start()])?;
        out.write_all(ATTR_REPLACEMENTS[m.pattern().as_usize()].as_bytes())?;
        last = m.end();
    }
    out.write_all(&s.as_bytes()[last..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr_all_specials() {
        assert_eq!(escape_attr(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }

    #[test]
    fn test_write_escaped_attr_matches_escape_attr() {
        for input in ["plain", "http://x/?a=1&b=2", "\"quoted\"", "", "&&"] {
            let mut out = Vec::new();
            write_escaped_attr(&mut out, input).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), escape_attr(input));
        }
    }
}
