//! Selection cuts applied to tracks and calorimeter clusters

use crate::{
    event::{CaloCluster, ClusterType, Track},
    numeric::Float,
};

/// Track quality requirements on the TPC reconstruction
#[derive(Clone, Debug, PartialEq)]
pub struct TpcQualityCut {
    /// Minimum number of crossed pad rows
    pub min_crossed_rows: Float,

    /// Minimum ratio of crossed rows to findable clusters
    pub min_crossed_over_findable: Float,
}
//
impl Default for TpcQualityCut {
    fn default() -> Self {
        Self {
            min_crossed_rows: 70.,
            min_crossed_over_findable: 0.8,
        }
    }
}
//
impl TpcQualityCut {
    /// Decide whether a track was reconstructed well enough in the TPC
    pub fn keep(&self, track: &Track) -> bool {
        if !track.tpc_refit {
            return false;
        }
        if track.tpc_crossed_rows < self.min_crossed_rows {
            return false;
        }
        if track.tpc_findable_clusters == 0 {
            return false;
        }
        let ratio = track.tpc_crossed_rows / (track.tpc_findable_clusters as Float);
        ratio >= self.min_crossed_over_findable
    }
}

/// Cuts on tracks and on the event vertex as seen from the track loop
#[derive(Clone, Debug, PartialEq)]
pub struct TrackCut {
    /// Filter bits which a track must carry to be considered at all
    pub filter_mask: u32,

    /// Optional TPC quality gate, applied together with the filter bits
    pub quality: Option<TpcQualityCut>,

    /// Maximum distance of the primary vertex from the nominal IP (cm)
    pub max_abs_vertex_z: Float,

    /// Tracks further than this from the electron hypothesis (in TPC
    /// sigmas) do not enter the electron signal
    pub max_electron_sigma: Float,
}
//
impl Default for TrackCut {
    fn default() -> Self {
        Self {
            filter_mask: Track::FILTER_BIT_MIN_BIAS,
            quality: None,
            max_abs_vertex_z: 20.,
            max_electron_sigma: 5.,
        }
    }
}
//
impl TrackCut {
    /// Hard gate applied before any track-level fill
    pub fn accepts(&self, track: &Track) -> bool {
        if !track.test_filter_bit(self.filter_mask) {
            return false;
        }
        match &self.quality {
            Some(quality) => quality.keep(track),
            None => true,
        }
    }

    /// Check the vertex position (the bounds themselves are accepted)
    ///
    /// Only a position known to lie outside of the window is rejected, so a
    /// NaN coordinate passes.
    ///
    pub fn vertex_in_range(&self, vertex_z: Float) -> bool {
        let window = -self.max_abs_vertex_z..=self.max_abs_vertex_z;
        vertex_z.is_nan() || window.contains(&vertex_z)
    }

    /// Loose electron compatibility: rejects far outliers only (NaN passes)
    pub fn electron_like(&self, n_sigma: Float) -> bool {
        n_sigma.is_nan() || n_sigma <= self.max_electron_sigma
    }
}

/// Cuts on calorimeter clusters
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterCut {
    /// Only clusters of this type are considered
    pub cluster_type: ClusterType,

    /// Minimum number of cells in the cluster
    pub min_cells: u32,

    /// Optional upper bound on the cluster energy (GeV)
    pub max_energy: Option<Float>,

    /// Optional lower bound on the M02 shower shape
    pub min_m02: Option<Float>,
}
//
impl Default for ClusterCut {
    fn default() -> Self {
        Self {
            cluster_type: ClusterType::PhosNeutral,
            min_cells: 1,
            max_energy: None,
            min_m02: None,
        }
    }
}
//
impl ClusterCut {
    /// Photon-like PHOS cluster selection, rejecting merged and noisy showers
    pub fn photon_like() -> Self {
        Self {
            max_energy: Some(1.5),
            min_m02: Some(0.2),
            ..Self::default()
        }
    }

    /// Decide whether a cluster is kept
    pub fn keep(&self, cluster: &CaloCluster) -> bool {
        if cluster.cluster_type != self.cluster_type || cluster.n_cells < self.min_cells {
            return false;
        }
        if let Some(max_energy) = self.max_energy {
            if cluster.energy > max_energy {
                return false;
            }
        }
        if let Some(min_m02) = self.min_m02 {
            if cluster.m02 < min_m02 {
                return false;
            }
        }
        true
    }
}
