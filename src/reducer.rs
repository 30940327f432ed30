//! Per-event selection of tracks and calorimeter clusters, and accumulation
//! of the selected quantities into histograms
//!
//! An EventReducer is created once per run (or per shard of a run). It books
//! its histograms at creation, is then handed events one at a time, and gives
//! its histograms back at the end of the run.

use crate::{
    conversion::{ConversionKey, PhotonConversionSource},
    cuts::{ClusterCut, TrackCut},
    event::{Event, TriggerMask},
    histogram::{HistogramSet, HistogramSpec},
    numeric::Float,
    pid::{PidResponse, Species},
    services::ServiceRegistry,
    Result,
};
use eyre::{bail, eyre};
use std::{fmt, str::FromStr};

/// Histogram keys
pub mod keys {
    #![allow(missing_docs)]
    pub const SELECTED_EVENTS: &str = "hSelectedEvents";
    pub const EVENT_PT: &str = "hEventPt";
    pub const VERTEX_Z: &str = "hVertexZ";
    pub const CLUSTER_ENERGY: &str = "hClusterEnergy";
    pub const RECONSTRUCTED_PHOTONS: &str = "hReconstructedPhotons";
    pub const TPC_RESPONSE: &str = "hTPCResponse";
    pub const ELECTRON_SIGNAL: &str = "hElectronSignal";
    pub const CLUSTER_TOF_VS_ENERGY: &str = "hClusterTOFvsEnergy";
}

/// Values filled into hSelectedEvents at each selection step
///
/// Value 4 is never filled. Consumers of the output rely on this layout, so
/// the gap is kept.
///
pub mod selection_step {
    use crate::numeric::Float;

    /// Track passed the filter bits
    pub const TRACK: Float = 0.;
    /// Track seen with the vertex inside the fiducial window
    pub const VERTEX: Float = 1.;
    /// Track entered the electron signal
    pub const ELECTRON: Float = 2.;
    /// Calorimeter cluster passed the cluster cuts
    pub const CLUSTER: Float = 3.;
    /// Conversion photon count was recorded
    pub const CONVERSIONS: Float = 5.;
}

const CALO_RESPONSE_HISTOGRAMS: [HistogramSpec; 7] = [
    HistogramSpec::one_d(keys::SELECTED_EVENTS, "Number Of Selected Events", (5, 0., 5.)),
    HistogramSpec::one_d(keys::EVENT_PT, "Event Transverse Momentum", (100, 0., 5.)),
    HistogramSpec::one_d(keys::VERTEX_Z, "Vertex Z-Coordinate", (100, -20., 20.)),
    HistogramSpec::one_d(keys::CLUSTER_ENERGY, "Cluster Energy", (100, 0., 25.)),
    HistogramSpec::one_d(
        keys::RECONSTRUCTED_PHOTONS,
        "Number Of Reconstructed Photons",
        (25, 0., 25.),
    ),
    HistogramSpec::two_d(keys::TPC_RESPONSE, "TPC Response", (100, 0., 4.), (250, 0., 250.)),
    HistogramSpec::two_d(
        keys::ELECTRON_SIGNAL,
        "Electron Signal",
        (100, 0., 4.),
        (100, -10., 10.),
    ),
];

const SIGMA0_PCM_PHOS_HISTOGRAMS: [HistogramSpec; 7] = [
    HistogramSpec::one_d(keys::EVENT_PT, "Event Transverse Momentum", (100, 0., 5.)),
    HistogramSpec::one_d(keys::VERTEX_Z, "Vertex Z-Coordinate", (100, -20., 20.)),
    HistogramSpec::one_d(keys::CLUSTER_ENERGY, "Cluster Energy", (25, 0., 5.)),
    HistogramSpec::one_d(
        keys::RECONSTRUCTED_PHOTONS,
        "Number Of Reconstructed Photons",
        (25, 0., 25.),
    ),
    HistogramSpec::two_d(keys::TPC_RESPONSE, "TPC Response", (100, 0., 4.), (250, 0., 250.)),
    HistogramSpec::two_d(
        keys::ELECTRON_SIGNAL,
        "Electron Signal",
        (100, 0., 4.),
        (100, -10., 10.),
    ),
    HistogramSpec::two_d(
        keys::CLUSTER_TOF_VS_ENERGY,
        "Cluster TOF vs Energy",
        (100, 0., 1e-6),
        (40, 0., 20.),
    ),
];

/// Flavour of the reduction, which decides the booked histograms
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Generic calorimeter response study
    CaloResponse,

    /// Σ⁰ → Λγ signal study, photons from PCM and PHOS
    Sigma0PcmPhos,
}
//
impl Variant {
    /// Histograms booked by this variant
    pub fn histogram_specs(self) -> &'static [HistogramSpec] {
        match self {
            Variant::CaloResponse => &CALO_RESPONSE_HISTOGRAMS,
            Variant::Sigma0PcmPhos => &SIGMA0_PCM_PHOS_HISTOGRAMS,
        }
    }

    /// Whether selection steps are counted in hSelectedEvents
    pub fn counts_selection(self) -> bool {
        matches!(self, Variant::CaloResponse)
    }

    /// Whether cluster timing is histogrammed
    pub fn fills_tof(self) -> bool {
        matches!(self, Variant::Sigma0PcmPhos)
    }
}
//
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::CaloResponse => write!(f, "calo-response"),
            Variant::Sigma0PcmPhos => write!(f, "sigma0-pcm-phos"),
        }
    }
}
//
impl FromStr for Variant {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "calo-response" => Ok(Variant::CaloResponse),
            "sigma0-pcm-phos" => Ok(Variant::Sigma0PcmPhos),
            _ => bail!(
                "Unknown variant {}, expected calo-response or sigma0-pcm-phos",
                s
            ),
        }
    }
}

/// Everything that a reducer needs to know before it sees its first event
#[derive(Clone, Debug, PartialEq)]
pub struct ReducerConfig {
    /// Histogram set to book
    pub variant: Variant,

    /// Track and vertex selection
    pub track_cut: TrackCut,

    /// Calorimeter cluster selection
    pub cluster_cut: ClusterCut,

    /// Name of the photon conversion service
    pub conversion_key: ConversionKey,

    /// Trigger classes which an event must have fired, if any
    pub required_trigger: Option<TriggerMask>,
}
//
impl ReducerConfig {
    /// Standard setup of a variant
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::CaloResponse => Self::calo_response(),
            Variant::Sigma0PcmPhos => Self::sigma0_pcm_phos(),
        }
    }

    /// Generic calorimeter response, on minimum-bias events
    pub fn calo_response() -> Self {
        Self {
            variant: Variant::CaloResponse,
            track_cut: TrackCut::default(),
            cluster_cut: ClusterCut::default(),
            conversion_key: ConversionKey::default(),
            required_trigger: Some(TriggerMask::INT7),
        }
    }

    /// Σ⁰ signal, with photon-like PHOS clusters only
    pub fn sigma0_pcm_phos() -> Self {
        Self {
            variant: Variant::Sigma0PcmPhos,
            cluster_cut: ClusterCut::photon_like(),
            ..Self::calo_response()
        }
    }
}

/// Why an event contributed nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The event header could not be decoded
    MissingHeader,
    /// No primary vertex was reconstructed
    MissingVertex,
    /// The required trigger classes did not fire
    NotTriggered,
}

/// What became of an event handed to the reducer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Track, cluster and conversion passes ran
    Reduced,
    /// The event was left out entirely
    Skipped(SkipReason),
}

/// Reduces events into a HistogramSet
pub struct EventReducer<'svc> {
    config: ReducerConfig,
    histograms: HistogramSet,
    pid: &'svc dyn PidResponse,
    conversion: Option<&'svc dyn PhotonConversionSource>,
}
//
impl<'svc> EventReducer<'svc> {
    /// Book the output histograms and resolve the external services
    ///
    /// A PID response is mandatory, as the electron signal cannot be computed
    /// without it. A missing conversion service is tolerated: the photon count
    /// is then never filled.
    ///
    pub fn create_outputs(config: ReducerConfig, services: &'svc ServiceRegistry) -> Result<Self> {
        let pid = services
            .pid()
            .ok_or_else(|| eyre!("No PID response available, cannot compute electron signals"))?;

        let conversion_name = config.conversion_key.name();
        let conversion = services.conversion(&conversion_name);
        if conversion.is_none() {
            tracing::warn!(
                service = %conversion_name,
                "no photon conversion service under this name, photon counts will stay empty"
            );
        }

        let histograms = HistogramSet::from_specs(config.variant.histogram_specs())?;
        tracing::debug!(
            variant = %config.variant,
            num_histograms = histograms.len(),
            "booked output histograms"
        );

        Ok(Self {
            config,
            histograms,
            pid,
            conversion,
        })
    }

    /// Configuration which this reducer was built with
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Run the track, cluster and conversion passes over one event
    ///
    /// Nothing in here fails: missing event content makes the event or the
    /// affected entry contribute fewer counts, and that's it.
    ///
    pub fn reduce(&mut self, event: &Event) -> Outcome {
        let header = match &event.header {
            Some(header) => header,
            None => return self.skip(SkipReason::MissingHeader),
        };
        if let Some(required) = self.config.required_trigger {
            if !header.trigger_mask.contains(required) {
                return self.skip(SkipReason::NotTriggered);
            }
        }
        let vertex_z = match &event.primary_vertex {
            Some(vertex) => vertex.z(),
            None => return self.skip(SkipReason::MissingVertex),
        };

        self.reduce_tracks(event, vertex_z);
        self.reduce_clusters(event);
        self.reduce_conversions(event);
        Outcome::Reduced
    }

    /// Current state of the histograms, republished in full after every event
    pub fn outputs(&self) -> &HistogramSet {
        &self.histograms
    }

    /// End of run: hand the histograms over to the caller
    pub fn finalize(self) -> HistogramSet {
        tracing::debug!(
            variant = %self.config.variant,
            entries = self.histograms.iter().map(|(_, h)| h.entries()).sum::<u64>(),
            "reducer finalized"
        );
        self.histograms
    }

    fn skip(&self, reason: SkipReason) -> Outcome {
        tracing::trace!(?reason, "event skipped");
        Outcome::Skipped(reason)
    }

    fn count(&mut self, step: Float) {
        if self.config.variant.counts_selection() {
            self.histograms.fill_1d(keys::SELECTED_EVENTS, step);
        }
    }

    fn reduce_tracks(&mut self, event: &Event, vertex_z: Float) {
        let pid = self.pid;
        for track in &event.tracks {
            if !self.config.track_cut.accepts(track) {
                continue;
            }
            self.histograms.fill_1d(keys::EVENT_PT, track.pt);
            self.histograms
                .fill_2d(keys::TPC_RESPONSE, track.p, track.tpc_signal);
            self.count(selection_step::TRACK);

            // Tracks of out-of-window events still enter the two fills above
            if !self.config.track_cut.vertex_in_range(vertex_z) {
                continue;
            }
            self.histograms.fill_1d(keys::VERTEX_Z, vertex_z);
            self.count(selection_step::VERTEX);

            let n_sigma = match pid.n_sigma_tpc(track, Species::Electron) {
                Some(n_sigma) if self.config.track_cut.electron_like(n_sigma) => n_sigma,
                _ => continue,
            };
            self.histograms
                .fill_2d(keys::ELECTRON_SIGNAL, track.pt, n_sigma);
            self.count(selection_step::ELECTRON);
        }
    }

    fn reduce_clusters(&mut self, event: &Event) {
        let fills_tof = self.config.variant.fills_tof();
        for cluster in &event.calo_clusters {
            if !self.config.cluster_cut.keep(cluster) {
                continue;
            }
            self.histograms.fill_1d(keys::CLUSTER_ENERGY, cluster.energy);
            self.count(selection_step::CLUSTER);
            if fills_tof {
                self.histograms
                    .fill_2d(keys::CLUSTER_TOF_VS_ENERGY, cluster.tof, cluster.energy);
            }
        }
    }

    fn reduce_conversions(&mut self, event: &Event) {
        let photons = match self.conversion.and_then(|source| source.photon_candidates(event)) {
            Some(photons) => photons,
            None => return,
        };
        self.histograms
            .fill_1d(keys::RECONSTRUCTED_PHOTONS, photons as Float);
        self.count(selection_step::CONVERSIONS);
    }
}
