//! Sequential back-end of the reduction

use crate::{histogram::HistogramSet, random::RandomGenerator, Result};

/// Reduce event shards one after the other
///
/// Shards are merged in order, which is also what the multi-threaded
/// back-end does.
///
pub fn run_reduction_impl(
    shards: Vec<(usize, RandomGenerator)>,
    reduce_events: impl Send + Sync + Fn(usize, &mut RandomGenerator) -> Result<HistogramSet>,
) -> Result<HistogramSet> {
    let mut shards = shards.into_iter();

    // Initialize the accumulator with the first shard
    let (first_size, mut first_rng) = shards
        .next()
        .expect("There should be at least one shard");
    let mut accumulator = reduce_events(first_size, &mut first_rng)?;

    // Reduce and integrate the other shards
    for (batch_size, mut rng) in shards {
        accumulator.merge(reduce_events(batch_size, &mut rng)?)?;
    }

    Ok(accumulator)
}
