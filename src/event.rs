//! This module defines the decoded event records that the reducer consumes
//!
//! Events are owned by whoever drives the event loop. The reducer only ever
//! borrows one for the duration of a single reduction call.

use crate::numeric::{Float, Vector3};
use std::fmt::{self, Display};

/// Set of trigger classes which fired for an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerMask(pub u32);
//
impl TriggerMask {
    /// Minimum-bias trigger (V0 coincidence)
    pub const INT7: Self = Self(1 << 1);

    /// High-energy PHOS trigger
    pub const PHI7: Self = Self(1 << 9);

    /// Truth that every trigger class of `other` fired
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Event-level bookkeeping
#[derive(Clone, Debug, PartialEq)]
pub struct EventHeader {
    /// Run which this event was recorded in
    pub run_number: u32,

    /// Trigger classes which fired
    pub trigger_mask: TriggerMask,
}

/// Reconstructed primary vertex
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex(Vector3);
//
impl Vertex {
    /// Build a vertex from its (x, y, z) position in cm
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Full vertex position
    pub fn xyz(&self) -> &Vector3 {
        &self.0
    }

    /// Position along the beam axis
    pub fn z(&self) -> Float {
        self.0.z
    }
}

/// Reconstructed charged-particle track
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Transverse momentum (GeV/c)
    pub pt: Float,

    /// Total momentum (GeV/c)
    pub p: Float,

    /// Track selection bits set during reconstruction
    pub filter_map: u32,

    /// Specific energy loss in the TPC (arbitrary units)
    pub tpc_signal: Float,

    /// Whether the TPC refit succeeded
    pub tpc_refit: bool,

    /// Number of crossed TPC pad rows
    pub tpc_crossed_rows: Float,

    /// Number of TPC clusters findable along the trajectory
    pub tpc_findable_clusters: u32,
}
//
impl Track {
    /// Minimum-bias track quality bit
    pub const FILTER_BIT_MIN_BIAS: u32 = 1;

    /// Truth that every bit of `mask` is set in the track's filter map
    pub fn test_filter_bit(&self, mask: u32) -> bool {
        self.filter_map & mask == mask
    }
}

/// Calorimeter which reconstructed a cluster, and its charge hypothesis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterType {
    /// PHOS cluster without a matched charged track
    PhosNeutral,
    /// PHOS cluster with a matched charged track
    PhosCharged,
    /// EMCal cluster without a matched charged track
    EmcalNeutral,
    /// EMCal cluster with a matched charged track
    EmcalCharged,
}

/// Reconstructed calorimeter cluster
#[derive(Clone, Debug, PartialEq)]
pub struct CaloCluster {
    /// Calorimeter and charge hypothesis
    pub cluster_type: ClusterType,

    /// Number of calorimeter cells in the cluster
    pub n_cells: u32,

    /// Deposited energy (GeV)
    pub energy: Float,

    /// Long axis of the shower ellipse
    pub m02: Float,

    /// Time of flight (s)
    pub tof: Float,
}

/// Secondary vertex candidate with two opposite-charge daughters
#[derive(Clone, Debug, PartialEq)]
pub struct V0Candidate {
    /// Whether the V0 was found during tracking (rather than offline)
    pub on_the_fly: bool,

    /// Invariant mass under the e⁺e⁻ hypothesis (GeV/c²)
    pub inv_mass: Float,
}

/// One decoded collision record
///
/// A missing header or vertex means that the event could not be fully
/// decoded, which the reducer handles by skipping it.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct Event {
    pub header: Option<EventHeader>,
    pub primary_vertex: Option<Vertex>,
    pub tracks: Vec<Track>,
    pub calo_clusters: Vec<CaloCluster>,
    pub v0s: Vec<V0Candidate>,
}

impl Display for Event {
    /// One-line summary of the event contents
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.header {
            Some(header) => write!(fmt, "run {}", header.run_number)?,
            None => write!(fmt, "run ?")?,
        }
        match &self.primary_vertex {
            Some(vertex) => write!(fmt, ", vz={:.2} cm", vertex.z())?,
            None => write!(fmt, ", no vertex")?,
        }
        write!(
            fmt,
            ", {} tracks, {} clusters, {} V0s",
            self.tracks.len(),
            self.calo_clusters.len(),
            self.v0s.len()
        )
    }
}
