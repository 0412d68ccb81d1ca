use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::http_probe::result::{Mechanism, Outcome, ResultKind};
use crate::targets::{ExpectedClass, Target};

/// Confusion matrix over "was blocking the right call", plus block mechanisms.
///
/// Positives are blocked requests: a true positive is malware that was blocked, a
/// false positive a benign URL that was blocked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total: u64,
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub mechanism_rst_count: u64,
    pub mechanism_timeout_count: u64,
    /// Probes that failed for reasons unrelated to the filter. These are also counted
    /// as "not blocked" in the matrix.
    pub probe_errors: u64,
}

impl RunStatistics {
    pub fn matrix_total(&self) -> u64 {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Share of malicious targets that were blocked.
    pub fn detection_rate(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Share of benign targets that were blocked.
    pub fn false_positive_rate(&self) -> Option<f64> {
        ratio(self.false_positive, self.false_positive + self.true_negative)
    }
}

fn ratio(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Accumulates outcomes into [`RunStatistics`]. `record` takes `&self` and may be
/// called from any number of tasks at once.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    total: AtomicU64,
    true_positive: AtomicU64,
    true_negative: AtomicU64,
    false_positive: AtomicU64,
    false_negative: AtomicU64,
    mechanism_rst_count: AtomicU64,
    mechanism_timeout_count: AtomicU64,
    probe_errors: AtomicU64,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, target: &Target, outcome: &Outcome) {
        let blocked = outcome.is_blocked();
        let cell = match (target.expected_class(), blocked) {
            (ExpectedClass::Bad, true) => &self.true_positive,
            (ExpectedClass::Bad, false) => &self.false_negative,
            (ExpectedClass::Good, true) => &self.false_positive,
            (ExpectedClass::Good, false) => &self.true_negative,
        };
        cell.fetch_add(1, Ordering::Relaxed);

        match outcome.mechanism {
            Mechanism::Rst => {
                self.mechanism_rst_count.fetch_add(1, Ordering::Relaxed);
            }
            Mechanism::Timeout => {
                self.mechanism_timeout_count.fetch_add(1, Ordering::Relaxed);
            }
            Mechanism::None | Mechanism::Http | Mechanism::Error => {}
        }

        if matches!(outcome.result_kind, ResultKind::ErrorNetwork | ResultKind::ErrorOther) {
            self.probe_errors.fetch_add(1, Ordering::Relaxed);
        }

        self.total.fetch_add(1, Ordering::Release);
    }

    pub fn snapshot(&self) -> RunStatistics {
        let total = self.total.load(Ordering::Acquire);
        RunStatistics {
            total,
            true_positive: self.true_positive.load(Ordering::Relaxed),
            true_negative: self.true_negative.load(Ordering::Relaxed),
            false_positive: self.false_positive.load(Ordering::Relaxed),
            false_negative: self.false_negative.load(Ordering::Relaxed),
            mechanism_rst_count: self.mechanism_rst_count.load(Ordering::Relaxed),
            mechanism_timeout_count: self.mechanism_timeout_count.load(Ordering::Relaxed),
            probe_errors: self.probe_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::http_probe::transport::TransportError;
    use crate::targets::Category;

    fn blocked(error: TransportError) -> Outcome {
        Outcome::from_transport_error("http://x.example", &error, 10.0)
    }

    #[test]
    fn test_benign_allowed_is_true_negative() {
        let stats = StatsAggregator::new();
        stats.record(
            &Target::new("good.example", Category::Benign),
            &Outcome::allowed("http://good.example", 200, 5.0),
        );
        assert_eq!(
            stats.snapshot(),
            RunStatistics {
                total: 1,
                true_negative: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malware_timeout_is_true_positive() {
        let stats = StatsAggregator::new();
        stats.record(
            &Target::new("bad.example", Category::Malicious),
            &blocked(TransportError::ConnectTimeout),
        );
        assert_eq!(
            stats.snapshot(),
            RunStatistics {
                total: 1,
                true_positive: 1,
                mechanism_timeout_count: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malware_reset_is_true_positive() {
        let stats = StatsAggregator::new();
        stats.record(
            &Target::new("bad2.example", Category::Malicious),
            &blocked(TransportError::ConnectionReset),
        );
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.true_positive, 1);
        assert_eq!(snapshot.mechanism_rst_count, 1);
        assert_eq!(snapshot.mechanism_timeout_count, 0);
    }

    #[test]
    fn test_benign_refused_is_false_positive() {
        let stats = StatsAggregator::new();
        stats.record(
            &Target::new("good2.example", Category::Benign),
            &blocked(TransportError::ConnectionRefused),
        );
        assert_eq!(
            stats.snapshot(),
            RunStatistics {
                total: 1,
                false_positive: 1,
                mechanism_rst_count: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_probe_errors_count_as_not_blocked() {
        let stats = StatsAggregator::new();
        let bad = Target::new("bad.example", Category::Malicious);
        let good = Target::new("good.example", Category::Benign);
        stats.record(&bad, &blocked(TransportError::NameResolution("nx".into())));
        stats.record(&good, &blocked(TransportError::Other("boom".into())));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.false_negative, 1);
        assert_eq!(snapshot.true_negative, 1);
        assert_eq!(snapshot.probe_errors, 2);
        assert_eq!(snapshot.mechanism_rst_count + snapshot.mechanism_timeout_count, 0);
        assert_eq!(snapshot.matrix_total(), snapshot.total);
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let stats = Arc::new(StatsAggregator::new());
        let bad = Arc::new(Target::new("bad.example", Category::Malicious));
        let good = Arc::new(Target::new("good.example", Category::Benign));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let stats = Arc::clone(&stats);
                let target = if i % 2 == 0 { Arc::clone(&bad) } else { Arc::clone(&good) };
                thread::spawn(move || {
                    for n in 0..1000 {
                        let outcome = if n % 2 == 0 {
                            blocked(TransportError::ConnectionReset)
                        } else {
                            blocked(TransportError::ReadTimeout)
                        };
                        stats.record(&target, &outcome);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread");
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 8000);
        assert_eq!(snapshot.matrix_total(), 8000);
        assert_eq!(snapshot.true_positive, 4000);
        assert_eq!(snapshot.false_positive, 4000);
        assert_eq!(snapshot.mechanism_rst_count, 4000);
        assert_eq!(snapshot.mechanism_timeout_count, 4000);
        assert!(
            snapshot.mechanism_rst_count + snapshot.mechanism_timeout_count
                <= snapshot.true_positive + snapshot.false_positive
        );
    }

    #[test]
    fn test_rates() {
        let stats = RunStatistics {
            total: 10,
            true_positive: 3,
            false_negative: 1,
            false_positive: 1,
            true_negative: 5,
            ..Default::default()
        };
        assert_eq!(stats.detection_rate(), Some(0.75));
        assert!((stats.false_positive_rate().expect("rate") - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(RunStatistics::default().detection_rate(), None);
    }
}
