use std::fmt;

/// An address exactly as it was submitted.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    raw: String,
}

impl EmailAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn local_part(&self) -> &str {
        match self.raw.split_once('@') {
            Some((local, _)) => local,
            None => &self.raw,
        }
    }

    pub fn domain(&self) -> &str {
        match self.raw.split_once('@') {
            Some((_, domain)) => domain,
            None => "",
        }
    }

    /// Lower-cased domain without trailing dot, used for set membership and
    /// cache keys. Domain names compare case-insensitively.
    pub fn domain_key(&self) -> String {
        domain_key(self.domain())
    }

    pub fn into_inner(self) -> String {
        self.raw
    }
}

pub(crate) fn domain_key(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for EmailAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EmailAddress {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_at() {
        let addr = EmailAddress::new("a@b@c.com");
        assert_eq!(addr.local_part(), "a");
        assert_eq!(addr.domain(), "b@c.com");
    }

    #[test]
    fn no_at_means_empty_domain() {
        let addr = EmailAddress::new("not-an-email");
        assert_eq!(addr.local_part(), "not-an-email");
        assert_eq!(addr.domain(), "");
    }

    #[test]
    fn domain_key_lowercases_and_trims_root_dot() {
        let addr = EmailAddress::new("User@MailInator.COM.");
        assert_eq!(addr.domain_key(), "mailinator.com");
        assert_eq!(addr.local_part(), "User");
        assert_eq!(addr.as_str(), "User@MailInator.COM.");
    }
}
