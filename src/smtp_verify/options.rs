use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Configuration knobs for [`SmtpProber`](super::SmtpProber).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    pub helo_domain: String,
    /// Envelope sender. `None` uses `postmaster@<target domain>`, an empty
    /// string sends the null reverse-path `<>`.
    pub mail_from: Option<String>,
    pub use_starttls: bool,
    pub starttls_required: bool,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub max_mx: usize,
    pub port: u16,
    pub catchall_probes: u8,
    pub ipv6: bool,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            helo_domain: "localhost".to_string(),
            mail_from: None,
            use_starttls: true,
            starttls_required: false,
            verify_tls: false,
            timeout: Duration::from_secs(5),
            max_mx: 3,
            port: 25,
            catchall_probes: 0,
            ipv6: false,
        }
    }
}

impl SmtpProbeOptions {
    pub fn envelope_sender(&self, domain: &str) -> String {
        match &self.mail_from {
            Some(sender) => sender.trim().to_string(),
            None => format!("postmaster@{domain}"),
        }
    }

    pub fn helo_name(&self) -> &str {
        let helo = self.helo_domain.trim();
        if helo.is_empty() { "localhost" } else { helo }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_defaults_to_postmaster() {
        let options = SmtpProbeOptions::default();
        assert_eq!(options.envelope_sender("example.com"), "postmaster@example.com");
    }

    #[test]
    fn empty_sender_is_null_path() {
        let options = SmtpProbeOptions {
            mail_from: Some(String::new()),
            ..SmtpProbeOptions::default()
        };
        assert_eq!(options.envelope_sender("example.com"), "");
    }

    #[test]
    fn blank_helo_falls_back() {
        let options = SmtpProbeOptions {
            helo_domain: "  ".to_string(),
            ..SmtpProbeOptions::default()
        };
        assert_eq!(options.helo_name(), "localhost");
    }
}
