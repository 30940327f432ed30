//! Calorimeter response: per-event reduction of tracks and calorimeter
//! clusters into histograms
//!
//!
//! # Introduction (for the physicist)
//!
//! This crate reduces reconstructed collision events into a handful of
//! histograms which characterize the response of the PHOS calorimeter and the
//! TPC, as a first step towards a Σ⁰ → Λγ analysis where the photon is
//! measured either in PHOS or through its conversion into an e⁺e⁻ pair (PCM).
//!
//! Two flavours of the reduction exist. The generic calorimeter response
//! counts how many tracks and clusters survive each selection step, while the
//! Σ⁰ flavour restricts itself to photon-like PHOS clusters and also records
//! their time of flight.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The reduction is a plain loop over each event's tracks and clusters, with
//! a few numeric cuts deciding which histograms get filled:
//!
//! * book the histograms and resolve the external services (PID response,
//!   photon conversion finder) once per run,
//! * for every event, run the track, cluster and conversion passes,
//! * hand the histograms back at the end of the run.
//!
//! Histogram contents are plain sums, so independent shards of a run can be
//! reduced separately and merged afterwards. The `scheduling` module does
//! exactly that, optionally on multiple threads.

#![warn(missing_docs)]

pub mod config;
pub mod conversion;
pub mod cuts;
pub mod event;
pub mod evgen;
pub mod histogram;
pub mod numeric;
pub mod output;
pub mod pid;
pub mod random;
pub mod reducer;
pub mod scheduling;
pub mod services;

pub use crate::{
    event::Event,
    histogram::HistogramSet,
    reducer::{EventReducer, Outcome, ReducerConfig, Variant},
    services::ServiceRegistry,
};

/// We'll use eyre's type-erased result type throughout the crate
pub type Result<T> = eyre::Result<T>;
