use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::http_probe::prelude::*;
use crate::stats::{RunStatistics, StatsAggregator};
use crate::targets::{Target, TargetSet};

/// Upper bound on the number of targets probed per loop.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    concurrency: usize,
    loops: usize,
    batch_size: usize,
}

impl RunSettings {
    pub fn new(concurrency: usize, loops: usize, batch_size: usize) -> Result<Self> {
        for (name, value) in [
            ("concurrency", concurrency),
            ("loops", loops),
            ("batch_size", batch_size),
        ] {
            if value == 0 {
                return Err(Error::InvalidParameter(format!("{name} must be at least 1")));
            }
        }
        Ok(Self {
            concurrency,
            loops,
            batch_size,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn loops(&self) -> usize {
        self.loops
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Runs shuffled batches of probes, at most `concurrency` at a time, and folds
/// every outcome into one [`RunStatistics`].
pub struct Runner {
    transport: Arc<dyn Transport>,
    settings: RunSettings,
}

impl Runner {
    pub fn new(transport: Arc<dyn Transport>, settings: RunSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Probe `loops` batches of targets. `on_outcome` sees every outcome once, in
    /// completion order. A loop's batch is fully drained before the next one starts.
    pub async fn run<F>(&self, targets: &TargetSet, mut on_outcome: F) -> RunStatistics
    where
        F: FnMut(&Target, &Outcome),
    {
        let stats = StatsAggregator::new();
        let shared = targets.shared();
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut order: Vec<usize> = (0..shared.len()).collect();

        for i in 0..self.settings.loops {
            order.shuffle(&mut rand::rng());
            let batch = &order[..order.len().min(self.settings.batch_size)];
            log::info!(
                "--- Loop {}/{} (Sending {} requests) ---",
                i + 1,
                self.settings.loops,
                batch.len()
            );

            let mut tasks = JoinSet::new();
            for &index in batch {
                let semaphore = Arc::clone(&semaphore);
                let transport = Arc::clone(&self.transport);
                let targets = Arc::clone(&shared);
                tasks.spawn(async move {
                    // The semaphore is never closed, so acquiring cannot fail.
                    let _permit = semaphore.acquire_owned().await.ok();
                    let outcome = probe(transport.as_ref(), &targets[index]).await;
                    (index, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, outcome)) => {
                        let target = &shared[index];
                        stats.record(target, &outcome);
                        on_outcome(target, &outcome);
                    }
                    Err(e) => log::error!("Probe task failed: {e}"),
                }
            }
        }

        stats.snapshot()
    }
}
