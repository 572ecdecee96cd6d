//! Address grammar checks (RFC 5321/5322 subset).
//!
//! The validator never rewrites its input: it reports whether the raw string
//! is acceptable and why not.

mod domain;
mod local;
mod types;

pub use types::{ValidationMode, ValidationReport};

use domain::check_domain;
use local::{is_dot_atom, is_quoted};

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

pub fn validate_email(email: &str, mode: ValidationMode) -> ValidationReport {
    let mut reasons = Vec::new();

    if email.len() > MAX_ADDRESS_LEN {
        reasons.push(format!("total length {} > {MAX_ADDRESS_LEN}", email.len()));
    }

    let Some((local, domain)) = email.split_once('@') else {
        reasons.push("must contain exactly one '@'".to_string());
        return ValidationReport::from_reasons(reasons);
    };
    if domain.contains('@') {
        reasons.push("must contain exactly one '@'".to_string());
        return ValidationReport::from_reasons(reasons);
    }

    if local.is_empty() || local.len() > MAX_LOCAL_LEN {
        reasons.push(format!(
            "local part length {} invalid (1..={MAX_LOCAL_LEN})",
            local.len()
        ));
    } else {
        let local_ok = match mode {
            ValidationMode::Strict => is_dot_atom(local),
            ValidationMode::Relaxed => is_dot_atom(local) || is_quoted(local),
        };
        if !local_ok {
            reasons.push(format!("invalid local part ({} rules)", mode.as_str()));
        }
    }

    check_domain(domain, &mut reasons);

    ValidationReport::from_reasons(reasons)
}

pub fn is_valid_syntax(email: &str, mode: ValidationMode) -> bool {
    validate_email(email, mode).ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_basic() {
        let r = validate_email("alice@example.com", ValidationMode::Strict);
        assert!(r.ok, "{:?}", r.reasons);
    }

    #[test]
    fn rejects_double_at() {
        assert!(!is_valid_syntax("a@@b.com", ValidationMode::Strict));
        assert!(!is_valid_syntax("a@b@c.com", ValidationMode::Relaxed));
    }

    #[test]
    fn rejects_missing_at() {
        let r = validate_email("not-an-email", ValidationMode::Strict);
        assert!(!r.ok);
        assert_eq!(r.reasons, vec!["must contain exactly one '@'".to_string()]);
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(!is_valid_syntax("@example.com", ValidationMode::Strict));
        assert!(!is_valid_syntax("alice@", ValidationMode::Strict));
        assert!(!is_valid_syntax("", ValidationMode::Strict));
    }

    #[test]
    fn surrounding_whitespace_is_not_trimmed() {
        assert!(!is_valid_syntax(" alice@example.com", ValidationMode::Strict));
    }

    #[test]
    fn relaxed_allows_quoted_local() {
        assert!(!is_valid_syntax("\"a b\"@example.com", ValidationMode::Strict));
        assert!(is_valid_syntax("\"a b\"@example.com", ValidationMode::Relaxed));
    }

    #[test]
    fn mixed_case_is_accepted() {
        assert!(is_valid_syntax("Alice.Smith@Example.COM", ValidationMode::Strict));
    }

    proptest! {
        #[test]
        fn without_at_is_invalid(s in "[^@]{0,40}") {
            prop_assert!(!is_valid_syntax(&s, ValidationMode::Relaxed));
        }

        #[test]
        fn dotless_domain_is_invalid(local in "[a-z]{1,10}", domain in "[a-z0-9-]{1,20}") {
            let email = format!("{local}@{domain}");
            prop_assert!(!is_valid_syntax(&email, ValidationMode::Strict));
        }

        #[test]
        fn extra_at_is_invalid(a in "[a-z]{1,8}", b in "[a-z]{1,8}", c in "[a-z]{1,8}") {
            let email = format!("{a}@{b}@{c}.com");
            prop_assert!(!is_valid_syntax(&email, ValidationMode::Relaxed));
        }
    }
}
