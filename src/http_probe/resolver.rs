use std::net::SocketAddr;
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

/// How long a name lookup may take for a probe with the given timeout. It has to end
/// well before the connect timer, or a dead name server passes for a silent drop.
pub fn lookup_timeout(probe_timeout: Duration) -> Duration {
    probe_timeout / 2
}

/// Plugs a trust-dns resolver into reqwest, so that lookup failures reach the
/// classifier as a typed `ResolveError` instead of an opaque getaddrinfo message.
#[derive(Clone)]
pub struct TrustDnsResolver {
    resolver: TokioAsyncResolver,
    lookup_timeout: Duration,
}

impl TrustDnsResolver {
    /// A lookup that has not finished after `lookup_timeout` fails with a
    /// [`ResolveErrorKind::Timeout`].
    pub fn new(resolver: TokioAsyncResolver, lookup_timeout: Duration) -> Self {
        Self {
            resolver,
            lookup_timeout,
        }
    }
}

impl Resolve for TrustDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        let lookup_timeout = self.lookup_timeout;
        Box::pin(async move {
            let lookup = tokio::time::timeout(lookup_timeout, resolver.lookup_ip(name.as_str()))
                .await
                .map_err(|_| ResolveError::from(ResolveErrorKind::Timeout))??;
            // Port 0 is replaced by the connector with the port from the URL.
            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
