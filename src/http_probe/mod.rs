pub mod probe;
pub mod resolver;
pub mod result;
pub mod transport;

pub mod prelude {
    pub use super::probe::{normalize_url, probe};
    pub use super::resolver::{TrustDnsResolver, lookup_timeout};
    pub use super::result::{Mechanism, Outcome, ResultKind};
    pub use super::transport::{HttpTransport, ProbeSettings, Transport, TransportError};
}

use std::fmt::Write;

/// Render an error with its whole cause chain, one cause per line.
pub fn error_chain(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}
