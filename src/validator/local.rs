/// Printable ASCII allowed in an unquoted local part besides letters and digits.
const ATEXT_SPECIALS: &[char] = &[
    '!', '#', '$', '%', '&', '\'', '*', '+', '-', '/', '=', '?', '^', '_', '`', '{', '|', '}',
    '~',
];

/// Dot-atom: atext runs separated by single dots, no leading/trailing dot.
pub(crate) fn is_dot_atom(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|atom| {
            !atom.is_empty()
                && atom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || ATEXT_SPECIALS.contains(&c))
        })
}

/// Relaxed mode also accepts a simple quoted string.
pub(crate) fn is_quoted(s: &str) -> bool {
    s.len() >= 2
        && s.starts_with('"')
        && s.ends_with('"')
        && !s[1..s.len() - 1].contains(['"', '\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_atom_rejects_bad_dots() {
        assert!(!is_dot_atom(".abc"));
        assert!(!is_dot_atom("abc."));
        assert!(!is_dot_atom("a..b"));
        assert!(is_dot_atom("a.b"));
        assert!(is_dot_atom("first+tag"));
    }

    #[test]
    fn dot_atom_rejects_space_and_at() {
        assert!(!is_dot_atom("a b"));
        assert!(!is_dot_atom("a@b"));
        assert!(!is_dot_atom(""));
    }

    #[test]
    fn quoted_string() {
        assert!(is_quoted("\"a b\""));
        assert!(!is_quoted("\"a\"b\""));
        assert!(!is_quoted("\""));
    }
}
