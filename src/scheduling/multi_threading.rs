//! Multi-threaded back-end of the reduction

use crate::{histogram::HistogramSet, random::RandomGenerator, Result};

use std::sync::Mutex;

/// Reduce event shards in parallel
///
/// Shard results are stored by shard index and merged in that order once all
/// shards are done, so that a run's output does not depend on thread timing.
///
pub fn run_reduction_impl(
    shards: Vec<(usize, RandomGenerator)>,
    reduce_events: impl Send + Sync + Fn(usize, &mut RandomGenerator) -> Result<HistogramSet>,
) -> Result<HistogramSet> {
    let accumulator = ReproducibleAccumulator::new(shards.len());

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        for (shard_id, (batch_size, mut rng)) in shards.into_iter().enumerate() {
            let accumulator_ref = &accumulator;
            let reduce_events_ref = &reduce_events;
            scope.spawn(move |_| {
                let result = reduce_events_ref(batch_size, &mut rng);
                accumulator_ref.set_task_result(shard_id, result);
            });
        }
    });

    accumulator.get_merged_result()
}

/// Reproducibility-optimized results accumulation mechanism
struct ReproducibleAccumulator {
    /// Storage for the results of parallel tasks
    results: Box<[Mutex<Option<Result<HistogramSet>>>]>,
}
//
impl ReproducibleAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Record the result of the n-th reduction task
    fn set_task_result(&self, task_id: usize, result: Result<HistogramSet>) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Merge the results in shard order, stopping at the first failed shard
    fn get_merged_result(self) -> Result<HistogramSet> {
        let mut results_iter = self.results.into_vec().into_iter().map(|entry| {
            entry
                .into_inner()
                .expect("Mutex data should be valid")
                .expect("Result should be ready")
        });

        let first_result = results_iter
            .next()
            .expect("There should be at least one task")?;

        results_iter.try_fold(first_result, |mut r1, r2| {
            r1.merge(r2?)?;
            Ok(r1)
        })
    }
}
