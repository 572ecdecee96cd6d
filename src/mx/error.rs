use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("MX lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    /// A failure remembered by the resolver cache; only the message survives.
    #[error("MX lookup for {domain} failed: {reason}")]
    Cached { domain: String, reason: String },
}

impl MxError {
    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(domain: &str, source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::Lookup {
            domain: domain.to_string(),
            source,
        }
    }
}
