//! This module takes care of scheduling the reduction work, encapsulating use
//! of multiple threads
//!
//! Events are reduced in shards. Each shard owns its own reducer and thus its
//! own HistogramSet, and shard results are merged by bin-wise addition.

#[cfg(not(feature = "multi-threading"))]
mod sequential;
#[cfg(not(feature = "multi-threading"))]
use sequential::run_reduction_impl;

#[cfg(feature = "multi-threading")]
mod multi_threading;
#[cfg(feature = "multi-threading")]
use multi_threading::run_reduction_impl;

use crate::{histogram::HistogramSet, random::RandomGenerator, Result};
use eyre::ensure;

/// Number of events in one shard
///
/// Every shard draws its events from its own random stream, so the shard size
/// defines the result. It must not depend on the scheduling back-end.
///
pub const EVENT_BATCH_SIZE: usize = 10_000;

/// Run the reduction in the manner that was configured at build time.
///
/// Takes as parameters the total number of events to be reduced, the seed of
/// the event source, and a kernel which reduces a certain number of events
/// drawn from a given random number generator into a HistogramSet.
///
/// Returns the merged histograms of all shards.
///
pub fn run_reduction(
    num_events: usize,
    seed: u64,
    reduce_events: impl Send + Sync + Fn(usize, &mut RandomGenerator) -> Result<HistogramSet>,
) -> Result<HistogramSet> {
    ensure!(num_events > 0, "Must reduce at least one event");
    let shards = shards(num_events, seed);
    tracing::debug!(num_events, num_shards = shards.len(), "starting reduction");
    run_reduction_impl(shards, reduce_events)
}

/// Split the work into shards: (event count, random stream) pairs
fn shards(mut num_events: usize, seed: u64) -> Vec<(usize, RandomGenerator)> {
    let mut rng = RandomGenerator::new(seed);
    let mut shards = Vec::with_capacity(num_events / EVENT_BATCH_SIZE + 1);
    while num_events > 0 {
        let batch_size = num_events.min(EVENT_BATCH_SIZE);
        num_events -= batch_size;
        shards.push((batch_size, rng.clone()));
        rng.jump();
    }
    shards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::HistogramSpec;

    const EVENTS: HistogramSpec = HistogramSpec::one_d("hEvents", "Reduced events", (1, 0., 1.));

    fn count_events(num_events: usize, rng: &mut RandomGenerator) -> Result<HistogramSet> {
        let mut set = HistogramSet::from_specs(&[EVENTS])?;
        for _ in 0..num_events {
            set.fill_1d("hEvents", rng.random());
        }
        Ok(set)
    }

    #[test]
    fn shards_cover_all_events() {
        let sizes = shards(25_001, 1)
            .into_iter()
            .map(|(size, _)| size)
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![10_000, 10_000, 5_001]);
    }

    #[test]
    fn every_event_is_reduced_once() {
        let merged = run_reduction(25_001, 1, count_events).unwrap();
        assert_eq!(merged.get("hEvents").unwrap().entries(), 25_001);
    }

    #[test]
    fn reduction_is_reproducible() {
        let run1 = run_reduction(12_345, 99, count_events).unwrap();
        let run2 = run_reduction(12_345, 99, count_events).unwrap();
        assert_eq!(run1, run2);
    }

    #[test]
    fn kernel_errors_propagate() {
        let failing = |_: usize, _: &mut RandomGenerator| -> Result<HistogramSet> {
            eyre::bail!("no services")
        };
        assert!(run_reduction(10, 1, failing).is_err());
        assert!(run_reduction(0, 1, count_events).is_err());
    }
}
