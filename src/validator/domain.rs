const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Checks the domain part after IDNA conversion. Each failing label adds one
/// reason; the first problem found in a label is the one reported.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) {
    if domain.is_empty() {
        reasons.push("domain is empty".to_string());
        return;
    }
    let Ok(ascii) = idna::domain_to_ascii(domain) else {
        reasons.push(format!("domain '{domain}' is not valid IDNA"));
        return;
    };
    if ascii.is_empty() {
        reasons.push("domain is empty after IDNA conversion".to_string());
        return;
    }

    if ascii.len() > MAX_DOMAIN_LEN {
        reasons.push(format!("domain length {} > {MAX_DOMAIN_LEN}", ascii.len()));
    }
    if !ascii.contains('.') {
        reasons.push("domain needs at least one dot".to_string());
    }
    for (i, label) in ascii.split('.').enumerate() {
        if let Some(problem) = label_problem(label) {
            reasons.push(format!("label {} '{label}': {problem}", i + 1));
        }
    }
}

fn label_problem(label: &str) -> Option<&'static str> {
    if label.is_empty() {
        Some("empty")
    } else if label.len() > MAX_LABEL_LEN {
        Some("longer than 63 octets")
    } else if label.starts_with('-') || label.ends_with('-') {
        Some("leading or trailing hyphen")
    } else if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        Some("only letters, digits and hyphens allowed")
    } else {
        None
    }
}
