use std::time::Instant;

use super::prelude::*;
use crate::targets::Target;

/// Prefix `http://` unless the URL already names an HTTP(S) scheme.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });

    if has_scheme {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Probe one target and classify what happened. Never fails: every transport error is
/// folded into the returned [`Outcome`].
pub async fn probe(transport: &dyn Transport, target: &Target) -> Outcome {
    let url = normalize_url(&target.url);

    let start = Instant::now();
    let result = transport.get(&url).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(status) => Outcome::allowed(url, status, elapsed_ms),
        Err(e) => Outcome::from_transport_error(url, &e, elapsed_ms),
    }
}
