use std::net::IpAddr;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use crate::domain::FetchError;

pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, FetchError> {
        // IP literals (including bracketed IPv6 from a URL host) skip the
        // resolver entirely.
        if let Ok(ip) = host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| FetchError::transport(format!("DNS lookup failed for '{}': {}", host, e)))?;
        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(FetchError::transport(format!("no DNS records for '{}'", host)));
        }
        Ok(ips)
    }
}

impl Default for HickoryDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}
