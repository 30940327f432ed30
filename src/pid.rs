//! Particle identification response, queried per track
//!
//! The reducer only needs one number from PID: how many standard deviations a
//! track's TPC energy loss lies away from the expectation for a given particle
//! species. Where that number comes from is up to the PidResponse
//! implementation that the reducer is handed at construction time.

use crate::{event::Track, numeric::Float};

/// Particle species hypotheses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Species {
    Electron,
    Muon,
    Pion,
    Kaon,
    Proton,
}
//
impl Species {
    /// Every supported hypothesis
    pub const ALL: [Species; 5] = [
        Species::Electron,
        Species::Muon,
        Species::Pion,
        Species::Kaon,
        Species::Proton,
    ];

    /// Rest mass (GeV/c²)
    pub fn mass(self) -> Float {
        match self {
            Species::Electron => 0.000_510_999,
            Species::Muon => 0.105_658,
            Species::Pion => 0.139_570,
            Species::Kaon => 0.493_677,
            Species::Proton => 0.938_272,
        }
    }
}

/// Source of TPC PID compatibility scores
pub trait PidResponse: Send + Sync {
    /// Signed distance of the track's TPC signal from the expectation for
    /// `species`, in units of the expected resolution, or None if it cannot
    /// be computed for this track
    fn n_sigma_tpc(&self, track: &Track, species: Species) -> Option<Float>;
}

impl<F> PidResponse for F
where
    F: Fn(&Track, Species) -> Option<Float> + Send + Sync,
{
    fn n_sigma_tpc(&self, track: &Track, species: Species) -> Option<Float> {
        self(track, species)
    }
}

/// Parametrized TPC response, using the ALEPH form of the Bethe-Bloch curve
#[derive(Clone, Debug, PartialEq)]
pub struct BetheBlochResponse {
    /// ALEPH parameters, giving the energy loss in units of the minimum
    pub params: [Float; 5],

    /// Signal of a minimum-ionizing particle, in detector units
    pub mip: Float,

    /// Relative dE/dx resolution
    pub resolution: Float,
}
//
impl Default for BetheBlochResponse {
    fn default() -> Self {
        Self {
            params: [0.076_176, 10.632, 1.3279e-5, 1.8631, 1.9479],
            mip: 50.,
            resolution: 0.07,
        }
    }
}
//
impl BetheBlochResponse {
    /// Mean energy loss (in units of the minimum) as a function of βγ
    pub fn aleph(&self, beta_gamma: Float) -> Float {
        let [p1, p2, p3, p4, p5] = self.params;
        let beta = beta_gamma / (1. + beta_gamma * beta_gamma).sqrt();
        let aa = beta.powf(p4);
        let bb = (p3 + (1. / beta_gamma).powf(p5)).ln();
        (p2 - aa - bb) * p1 / aa
    }

    /// Expected TPC signal of a particle with momentum `p`, if p is physical
    pub fn expected_signal(&self, p: Float, species: Species) -> Option<Float> {
        if p.is_nan() || p <= 0. {
            return None;
        }
        Some(self.mip * self.aleph(p / species.mass()))
    }
}
//
impl PidResponse for BetheBlochResponse {
    fn n_sigma_tpc(&self, track: &Track, species: Species) -> Option<Float> {
        let expected = self.expected_signal(track.p, species)?;
        Some((track.tpc_signal - expected) / (self.resolution * expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track(p: Float, tpc_signal: Float) -> Track {
        Track {
            pt: p,
            p,
            filter_map: 1,
            tpc_signal,
            tpc_refit: true,
            tpc_crossed_rows: 120.,
            tpc_findable_clusters: 130,
        }
    }

    #[test]
    fn minimum_ionization_is_normalized() {
        let response = BetheBlochResponse::default();
        assert_relative_eq!(response.aleph(3.5), 1., max_relative = 0.02);
    }

    #[test]
    fn electrons_sit_on_the_plateau() {
        let response = BetheBlochResponse::default();
        let electron = response.expected_signal(1.3, Species::Electron).unwrap();
        let pion = response.expected_signal(1.3, Species::Pion).unwrap();
        assert!(electron > 75. && electron < 85.);
        assert!(pion < electron);
    }

    #[test]
    fn n_sigma_is_zero_on_expectation() {
        let response = BetheBlochResponse::default();
        let expected = response.expected_signal(0.8, Species::Electron).unwrap();
        let n_sigma = response
            .n_sigma_tpc(&track(0.8, expected), Species::Electron)
            .unwrap();
        assert_relative_eq!(n_sigma, 0., epsilon = 1e-9);

        let shifted = track(0.8, expected * 1.14);
        let n_sigma = response.n_sigma_tpc(&shifted, Species::Electron).unwrap();
        assert_relative_eq!(n_sigma, 2., epsilon = 1e-6);
    }

    #[test]
    fn unphysical_momentum_has_no_response() {
        let response = BetheBlochResponse::default();
        assert_eq!(response.n_sigma_tpc(&track(0., 50.), Species::Electron), None);
    }

    #[test]
    fn closures_are_responses() {
        let fixed = |_: &Track, species: Species| (species == Species::Electron).then_some(2.);
        assert_eq!(fixed.n_sigma_tpc(&track(1., 50.), Species::Electron), Some(2.));
        assert_eq!(fixed.n_sigma_tpc(&track(1., 50.), Species::Pion), None);
    }
}
