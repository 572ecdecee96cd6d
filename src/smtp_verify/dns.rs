use std::net::{IpAddr, SocketAddr};

use crate::mx::DnsBackend;

use super::error::ProbeError;

/// Socket addresses for a mail exchanger. IP literals skip DNS; names go
/// through the timeout-bounded backend.
pub(crate) fn exchanger_addrs<D: DnsBackend>(
    dns: &D,
    host: &str,
    port: u16,
    allow_ipv6: bool,
) -> Result<Vec<SocketAddr>, ProbeError> {
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    let ips = match literal.parse::<IpAddr>() {
        Ok(ip) => vec![ip],
        Err(_) => dns.query_ip(host).map_err(|source| ProbeError::Resolve {
            host: host.to_string(),
            source,
        })?,
    };

    let addrs: Vec<SocketAddr> = ips
        .into_iter()
        .filter(|ip| allow_ipv6 || ip.is_ipv4())
        .map(|ip| SocketAddr::new(ip, port))
        .collect();
    if addrs.is_empty() {
        return Err(ProbeError::NoAddresses {
            host: host.to_string(),
        });
    }
    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mx::tests::StubDns;
    use std::net::Ipv6Addr;

    #[test]
    fn literal_skips_dns() {
        let dns = StubDns::default();
        let addrs = exchanger_addrs(&dns, "127.0.0.1", 2525, false).expect("literal");
        assert_eq!(addrs, vec!["127.0.0.1:2525".parse::<SocketAddr>().expect("addr")]);
    }

    #[test]
    fn ipv6_filtered_unless_allowed() {
        let dns = StubDns::default().with_host(
            "mx.example.com",
            vec![IpAddr::V6(Ipv6Addr::LOCALHOST)],
        );
        let err = exchanger_addrs(&dns, "mx.example.com", 25, false).expect_err("filtered");
        assert!(matches!(err, ProbeError::NoAddresses { .. }));
        let addrs = exchanger_addrs(&dns, "mx.example.com", 25, true).expect("allowed");
        assert_eq!(addrs.len(), 1);
    }

    #[test]
    fn lookup_failure_is_resolve_error() {
        let dns = StubDns::default().failing("mx.example.com");
        let err = exchanger_addrs(&dns, "mx.example.com", 25, false).expect_err("fails");
        assert!(matches!(err, ProbeError::Resolve { .. }));
    }
}
