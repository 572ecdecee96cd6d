use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no mail exchangers to probe")]
    NoExchangers,
    #[error("address lookup for {host} failed: {source}")]
    Resolve {
        host: String,
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("no usable address for {host}")]
    NoAddresses { host: String },
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{host} timed out")]
    Timeout { host: String },
    #[error("I/O error with {host}: {source}")]
    Io {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TLS setup failed: {source}")]
    TlsSetup {
        #[source]
        source: native_tls::Error,
    },
    #[error("TLS handshake with {host} failed: {reason}")]
    Tls { host: String, reason: String },
    #[error("protocol error with {host}: {reason}")]
    Protocol { host: String, reason: String },
}

impl ProbeError {
    pub(crate) fn io(host: &str, source: std::io::Error) -> Self {
        use std::io::ErrorKind::{TimedOut, WouldBlock};
        if matches!(source.kind(), TimedOut | WouldBlock) {
            Self::Timeout {
                host: host.to_string(),
            }
        } else {
            Self::Io {
                host: host.to_string(),
                source,
            }
        }
    }

    pub(crate) fn protocol(host: &str, reason: impl Into<String>) -> Self {
        Self::Protocol {
            host: host.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
