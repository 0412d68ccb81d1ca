use std::fmt;

use serde::{Deserialize, Serialize};

use super::transport::TransportError;

/// Longest error detail kept on an [`Outcome`].
const DETAIL_WIDTH: usize = 20;

/// What happened to a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultKind {
    /// A response came back through the filter.
    Allowed,
    /// The connection was actively refused or reset.
    BlockedRst,
    /// No handshake completed before the timeout: packets were silently dropped.
    BlockedTimeout,
    /// Connected, but no response arrived before the timeout.
    BlockedReadTimeout,
    /// Could not connect for a reason unrelated to filtering, such as DNS failure.
    ErrorNetwork,
    ErrorOther,
}

impl ResultKind {
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            ResultKind::BlockedRst | ResultKind::BlockedTimeout | ResultKind::BlockedReadTimeout
        )
    }

    pub fn mechanism(self) -> Mechanism {
        match self {
            ResultKind::Allowed => Mechanism::Http,
            ResultKind::BlockedRst => Mechanism::Rst,
            ResultKind::BlockedTimeout | ResultKind::BlockedReadTimeout => Mechanism::Timeout,
            ResultKind::ErrorNetwork | ResultKind::ErrorOther => Mechanism::Error,
        }
    }
}

/// Coarse tag of how a probe ended, used for the mechanism counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    #[default]
    None,
    Rst,
    Timeout,
    Http,
    Error,
}

/// The classified result of one probe.
///
/// Only the constructors build outcomes, which keeps `result_kind`, `mechanism` and
/// `status_code` consistent: a status code is present exactly when the request was
/// allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub url: String,
    pub result_kind: ResultKind,
    pub status_code: Option<u16>,
    pub duration_ms: f64,
    pub mechanism: Mechanism,
    pub detail: Option<String>,
}

impl Outcome {
    fn new(url: String, result_kind: ResultKind, status_code: Option<u16>, duration_ms: f64) -> Self {
        Self {
            url,
            result_kind,
            status_code,
            duration_ms: duration_ms.max(0.0),
            mechanism: result_kind.mechanism(),
            detail: None,
        }
    }

    pub fn allowed(url: impl Into<String>, status_code: u16, duration_ms: f64) -> Self {
        Self::new(url.into(), ResultKind::Allowed, Some(status_code), duration_ms)
    }

    /// Map a transport failure onto the outcome taxonomy.
    pub fn from_transport_error(url: impl Into<String>, error: &TransportError, duration_ms: f64) -> Self {
        let url = url.into();
        let kind = match error {
            TransportError::ConnectTimeout => ResultKind::BlockedTimeout,
            TransportError::ReadTimeout => ResultKind::BlockedReadTimeout,
            TransportError::ConnectionRefused | TransportError::ConnectionReset => ResultKind::BlockedRst,
            TransportError::NameResolution(_) | TransportError::Network(_) => ResultKind::ErrorNetwork,
            TransportError::Other(_) => ResultKind::ErrorOther,
        };

        // Unclassified failures are not timed, the elapsed time says nothing about the filter.
        let duration_ms = if kind == ResultKind::ErrorOther { 0.0 } else { duration_ms };
        let mut outcome = Self::new(url, kind, None, duration_ms);
        if kind.mechanism() == Mechanism::Error {
            outcome.detail = Some(error.to_string().chars().take(DETAIL_WIDTH).collect());
        }
        outcome
    }

    pub fn is_blocked(&self) -> bool {
        self.result_kind.is_blocked()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.result_kind, self.status_code) {
            (ResultKind::Allowed, Some(code)) => write!(f, "ALLOWED ({code})"),
            (ResultKind::Allowed, None) => f.write_str("ALLOWED"),
            (ResultKind::BlockedTimeout, _) => f.write_str("BLOCKED (Silent Drop)"),
            (ResultKind::BlockedReadTimeout, _) => f.write_str("BLOCKED (Read Timeout)"),
            (ResultKind::BlockedRst, _) => f.write_str("BLOCKED (TCP Reset)"),
            (ResultKind::ErrorNetwork, _) => f.write_str("ERROR (Network/DNS)"),
            (ResultKind::ErrorOther, _) => {
                write!(f, "ERROR: {}", self.detail.as_deref().unwrap_or("unknown"))
            }
        }
    }
}
