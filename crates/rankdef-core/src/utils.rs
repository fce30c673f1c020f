/// True if `s` is a plain expression identifier: `[A-Za-z_$@][A-Za-z0-9_$@]*`.
///
/// # Examples
/// ```
/// use rankdef_core::utils::is_identifier;
/// assert!(is_identifier("my_score"));
/// assert!(!is_identifier("2x"));
/// assert!(!is_identifier("a-b"));
/// ```
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_identifier_start(first) && chars.all(is_identifier_continue)
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '$' | '@')
}

pub fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '@')
}

/// Strip one pair of matching surrounding quotes, if present.
///
/// # Examples
/// ```
/// use rankdef_core::utils::unquote;
/// assert_eq!(unquote("\"a b\""), "a b");
/// assert_eq!(unquote("'x'"), "x");
/// assert_eq!(unquote("plain"), "plain");
/// ```
pub fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2
            && let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote))
        {
            return inner;
        }
    }
    s
}
