use std::net::IpAddr;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::system_conf::read_system_conf;

use super::cache::BoundedCache;
use super::{Error, MxOptions, MxRecord, MxStatus};
use crate::address::domain_key;

/// Raw DNS queries the resolver and the SMTP prober need.
pub trait DnsBackend: Send + Sync {
    fn query_mx(&self, domain: &str) -> Result<MxStatus, ResolveError>;

    fn query_ip(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

impl<T: DnsBackend + ?Sized> DnsBackend for Arc<T> {
    fn query_mx(&self, domain: &str) -> Result<MxStatus, ResolveError> {
        (**self).query_mx(domain)
    }

    fn query_ip(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        (**self).query_ip(host)
    }
}

/// System-configured DNS resolver with a bounded per-query timeout.
pub struct DnsResolver {
    runtime: Runtime,
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    pub fn from_system_conf(options: &MxOptions) -> Result<Self, Error> {
        let (config, mut opts) = read_system_conf().map_err(Error::resolver_init)?;
        opts.timeout = options.timeout;
        opts.attempts = options.attempts.max(1);

        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mailverdict-dns")
            .enable_all()
            .build()
            .map_err(Error::resolver_init)?;
        let inner = {
            let _guard = runtime.enter();
            TokioAsyncResolver::tokio(config, opts)
        };
        Ok(Self { runtime, inner })
    }
}

impl DnsBackend for DnsResolver {
    fn query_mx(&self, domain: &str) -> Result<MxStatus, ResolveError> {
        match self.runtime.block_on(self.inner.mx_lookup(domain)) {
            Ok(lookup) => {
                let records = lookup
                    .iter()
                    .map(|mx| {
                        MxRecord::new(mx.preference(), normalize_exchange(&mx.exchange().to_utf8()))
                    })
                    .collect();
                Ok(MxStatus::from_records(records))
            }
            Err(err) if is_no_records(&err) => Ok(MxStatus::NoRecords),
            Err(err) => Err(err),
        }
    }

    fn query_ip(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        match self.runtime.block_on(self.inner.lookup_ip(host)) {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// One-off MX lookup with the system resolver and default options.
pub fn check_mx(domain: &str) -> Result<MxStatus, Error> {
    let key = domain_key(domain);
    if key.is_empty() {
        return Err(Error::EmptyDomain);
    }
    let resolver = DnsResolver::from_system_conf(&MxOptions::default())?;
    resolver
        .query_mx(&key)
        .map_err(|source| Error::lookup(&key, source))
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

/// Seam the verification pipeline resolves mail exchangers through.
pub trait MxLookup: Send + Sync {
    fn exchanges(&self, domain: &str) -> Result<Vec<MxRecord>, Error>;

    fn has_mx(&self, domain: &str) -> bool {
        matches!(self.exchanges(domain), Ok(records) if !records.is_empty())
    }
}

#[derive(Debug, Clone)]
enum CachedAnswer {
    Status(MxStatus),
    Failed(String),
}

/// MX resolver with a bounded read-through cache keyed on the lower-cased
/// domain. Failures are cached too: within one batch a domain that timed out
/// once is not asked again.
pub struct MxResolver<D = Arc<DnsResolver>> {
    dns: D,
    cache: BoundedCache<CachedAnswer>,
}

impl MxResolver<Arc<DnsResolver>> {
    pub fn from_system_conf(options: &MxOptions) -> Result<Self, Error> {
        let dns = Arc::new(DnsResolver::from_system_conf(options)?);
        Ok(Self::with_backend(dns, options))
    }
}

impl<D: DnsBackend> MxResolver<D> {
    pub fn with_backend(dns: D, options: &MxOptions) -> Self {
        Self {
            dns,
            cache: BoundedCache::new(options.cache_capacity),
        }
    }

    pub fn backend(&self) -> &D {
        &self.dns
    }

    pub fn lookup(&self, domain: &str) -> Result<MxStatus, Error> {
        let key = domain_key(domain);
        if key.is_empty() {
            return Err(Error::EmptyDomain);
        }

        let answer = match self.cache.get(&key) {
            Some(hit) => {
                tracing::trace!(domain = %key, "mx cache hit");
                hit
            }
            None => {
                let answer = match self.dns.query_mx(&key) {
                    Ok(status) => CachedAnswer::Status(status),
                    Err(err) => {
                        tracing::warn!(domain = %key, error = %err, "MX lookup failed");
                        CachedAnswer::Failed(err.to_string())
                    }
                };
                self.cache.insert(key.clone(), answer.clone());
                answer
            }
        };

        match answer {
            CachedAnswer::Status(status) => Ok(status),
            CachedAnswer::Failed(reason) => Err(Error::Cached {
                domain: key,
                reason,
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_domains(&self) -> usize {
        self.cache.len()
    }
}

impl<D: DnsBackend> MxLookup for MxResolver<D> {
    fn exchanges(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        self.lookup(domain).map(|status| status.records().to_vec())
    }
}
