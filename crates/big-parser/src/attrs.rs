//! Include statement attribute tokenizer.
//!
//! Recognizes `key="value"` pairs, allowing one whitespace character on
//! either side of `=`. Keys are ASCII word characters, `:` and `-`. Anything that
//! does not form a pair is skipped.

/// Parse `key="value"` pairs in source order.
///
/// # Example
///
/// ```
/// use big_parser::parse_attributes;
///
/// let attrs = parse_attributes(r#"class="well" data-id = "7""#);
/// assert_eq!(attrs[0], ("class".to_owned(), "well".to_owned()));
/// assert_eq!(attrs[1], ("data-id".to_owned(), "7".to_owned()));
/// ```
pub fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut remaining = input;

    while let Some(first) = remaining.chars().next() {
        let key_len = remaining
            .find(|c: char| !is_key_char(c))
            .unwrap_or(remaining.len());

        if key_len == 0 {
            remaining = &remaining[first.len_utf8()..];
            continue;
        }

        let (key, rest) = remaining.split_at(key_len);
        if let Some((value, rest)) = parse_quoted_value(rest) {
            attrs.push((key.to_owned(), value.to_owned()));
            remaining = rest;
        } else {
            remaining = rest;
        }
    }

    attrs
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-')
}

/// Parse `="value"` with optional single spaces around `=`.
///
/// Returns the value and the input after the closing quote.
fn parse_quoted_value(s: &str) -> Option<(&str, &str)> {
    let s = skip_one_whitespace(s).strip_prefix('=')?;
    let s = skip_one_whitespace(s).strip_prefix('"')?;
    let end = s.find('"')?;
    Some((&s[..end], &s[end + 1..]))
}

fn skip_one_whitespace(s: &str) -> &str {
    match s.chars().next() {
        Some(c) if c.is_whitespace() => &s[c.len_utf8()..],
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kv(key: &str, value: &str) -> (String, String) {
        (key.to_owned(), value.to_owned())
    }

    #[test]
    fn test_empty() {
        assert!(parse_attributes("").is_empty());
        assert!(parse_attributes("   ").is_empty());
    }

    #[test]
    fn test_single_pair() {
        assert_eq!(parse_attributes(r#"class="well""#), vec![kv("class", "well")]);
    }

    #[test]
    fn test_keeps_source_order() {
        let attrs = parse_attributes(r#"b="2" a="1" c="3""#);

        assert_eq!(
            attrs,
            vec![
                kv("b", "2"),
                kv("a", "1"),
                kv("c", "3"),
            ]
        );
    }

    #[test]
    fn test_one_space_around_equals() {
        assert_eq!(parse_attributes(r#"id = "x""#), vec![kv("id", "x")]);
        // Two spaces do not form a pair.
        assert!(parse_attributes(r#"id  =  "x""#).is_empty());
    }

    #[test]
    fn test_namespaced_and_dashed_keys() {
        let attrs = parse_attributes(r#"ng:bind="a" data-role="b""#);

        assert_eq!(attrs[0], kv("ng:bind", "a"));
        assert_eq!(attrs[1], kv("data-role", "b"));
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(parse_attributes(r#"title="""#), vec![kv("title", "")]);
    }

    #[test]
    fn test_skips_unquoted_and_bare_words() {
        let attrs = parse_attributes(r#"hidden width=100 title="ok""#);

        assert_eq!(attrs, vec![kv("title", "ok")]);
    }

    #[test]
    fn test_unterminated_value_ignored() {
        assert!(parse_attributes(r#"title="open"#).is_empty());
    }

    #[test]
    fn test_single_quotes_not_recognized() {
        assert!(parse_attributes("title='x'").is_empty());
    }

    #[test]
    fn test_keys_are_ascii_only() {
        assert_eq!(parse_attributes(r#"tïtle="x""#), vec![kv("tle", "x")]);
        assert!(parse_attributes(r#"ключ="x""#).is_empty());
    }

    #[test]
    fn test_unicode_values() {
        assert_eq!(parse_attributes(r#"title="Æblegrød""#), vec![kv("title", "Æblegrød")]);
    }
}
