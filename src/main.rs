//! Reduction driver: feeds toy events to the reducer and writes the results
//!
//! Usage: `calo_response [config file]` (defaults to `reduce.cfg`). The log
//! level is controlled by the `RUST_LOG` environment variable.

use calo_response::{
    config::Configuration,
    conversion::V0Reader,
    evgen::EventGenerator,
    output,
    pid::BetheBlochResponse,
    random::RandomGenerator,
    scheduling, EventReducer, HistogramSet, Result, ServiceRegistry,
};

use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use std::time::Instant;

/// Run number stamped into the generated events
const RUN_NUMBER: u32 = 256504;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ### CONFIGURATION READOUT ###

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "reduce.cfg".to_owned());
    let cfg = Configuration::load(&config_path).wrap_err("Failed to load the configuration")?;

    // ### SERVICES AND EVENT SOURCE ###

    let services = ServiceRegistry::new()
        .with_pid(BetheBlochResponse::default())
        .with_conversion(
            cfg.conversion_key.name(),
            V0Reader {
                only_on_the_fly: true,
                max_inv_mass: Some(0.1),
            },
        );
    let evgen = EventGenerator::new(BetheBlochResponse::default(), RUN_NUMBER);
    let reducer_config = cfg.reducer_config();

    // Start the clock after configuration I/O
    let saved_time = Instant::now();

    // ### REDUCTION ###

    // This kernel reduces a number of events, drawn from a given random
    // number generator state, into a fresh set of histograms
    let reduce_events = |num_events: usize, rng: &mut RandomGenerator| -> Result<HistogramSet> {
        let mut reducer = EventReducer::create_outputs(reducer_config.clone(), &services)?;
        for _ in 0..num_events {
            let event = evgen.generate(rng);
            reducer.reduce(&event);
        }
        Ok(reducer.finalize())
    };
    let histograms = scheduling::run_reduction(cfg.num_events, cfg.seed, reduce_events)?;

    // ### RESULTS DISPLAY AND STORAGE ###

    let elapsed_time = saved_time.elapsed();
    output::dump_results(&cfg, &histograms, elapsed_time)
        .wrap_err("Failed to output the results")?;

    Ok(())
}
