//! Toy source of decoded events, standing in for the external event loop
//!
//! Events are generated with just enough realism to exercise every branch of
//! the reducer: vertices outside the fiducial window, tracks with and without
//! the minimum-bias filter bit, electron and hadron energy loss, calorimeter
//! clusters of every type, and the occasional undecodable event.

use crate::{
    event::{
        CaloCluster, ClusterType, Event, EventHeader, Track, TriggerMask, V0Candidate, Vertex,
    },
    numeric::Float,
    pid::{BetheBlochResponse, Species},
    random::RandomGenerator,
};

/// Relative abundances of charged species, in `Species::ALL` order
const SPECIES_ABUNDANCES: [Float; 5] = [0.05, 0.02, 0.75, 0.10, 0.08];

/// Cluster types, drawn uniformly
const CLUSTER_TYPES: [ClusterType; 4] = [
    ClusterType::PhosNeutral,
    ClusterType::PhosCharged,
    ClusterType::EmcalNeutral,
    ClusterType::EmcalCharged,
];

/// Generator of synthetic collision events
pub struct EventGenerator {
    /// Energy loss model used to compute TPC signals
    response: BetheBlochResponse,

    /// Run number stamped into every header
    run_number: u32,
}
//
impl EventGenerator {
    /// Width of the vertex distribution along the beam (cm)
    pub const VERTEX_Z_SIGMA: Float = 10.;

    /// Fraction of events which come without a reconstructed vertex
    pub const MISSING_VERTEX_RATE: Float = 0.02;

    /// Set up event generation with a given energy loss model
    pub fn new(response: BetheBlochResponse, run_number: u32) -> Self {
        Self {
            response,
            run_number,
        }
    }

    /// Generate one event
    pub fn generate(&self, rng: &mut RandomGenerator) -> Event {
        let trigger_mask = if rng.chance(0.9) {
            TriggerMask::INT7
        } else {
            TriggerMask::PHI7
        };
        let primary_vertex = (!rng.chance(Self::MISSING_VERTEX_RATE)).then(|| {
            Vertex::new(
                rng.normal(0., 0.01),
                rng.normal(0., 0.01),
                rng.normal(0., Self::VERTEX_Z_SIGMA),
            )
        });

        let num_tracks = rng.below(40);
        let tracks = (0..num_tracks).map(|_| self.generate_track(rng)).collect();
        let num_clusters = rng.below(6);
        let calo_clusters = (0..num_clusters).map(|_| generate_cluster(rng)).collect();
        let num_v0s = rng.below(4);
        let v0s = (0..num_v0s)
            .map(|_| V0Candidate {
                on_the_fly: rng.chance(0.5),
                inv_mass: rng.exponential(0.05),
            })
            .collect();

        Event {
            header: Some(EventHeader {
                run_number: self.run_number,
                trigger_mask,
            }),
            primary_vertex,
            tracks,
            calo_clusters,
            v0s,
        }
    }

    fn generate_track(&self, rng: &mut RandomGenerator) -> Track {
        let species = pick_species(rng);
        let pt = rng.exponential(0.5);
        let eta = rng.uniform(-0.9, 0.9);
        let p = pt * eta.cosh();
        let expected = self
            .response
            .expected_signal(p, species)
            .unwrap_or(self.response.mip);
        let tpc_signal = expected * (1. + rng.normal(0., self.response.resolution));

        let filter_map = (rng.chance(0.8) as u32) | ((rng.chance(0.5) as u32) << 1);
        let tpc_findable_clusters = 100 + rng.below(60) as u32;
        let tpc_crossed_rows = (tpc_findable_clusters as Float) * rng.uniform(0.6, 1.);

        Track {
            pt,
            p,
            filter_map,
            tpc_signal,
            tpc_refit: rng.chance(0.95),
            tpc_crossed_rows,
            tpc_findable_clusters,
        }
    }
}

fn pick_species(rng: &mut RandomGenerator) -> Species {
    let mut draw = rng.random() * SPECIES_ABUNDANCES.iter().sum::<Float>();
    for (&species, &abundance) in Species::ALL.iter().zip(SPECIES_ABUNDANCES.iter()) {
        if draw < abundance {
            return species;
        }
        draw -= abundance;
    }
    Species::Pion
}

fn generate_cluster(rng: &mut RandomGenerator) -> CaloCluster {
    CaloCluster {
        cluster_type: CLUSTER_TYPES[rng.below(CLUSTER_TYPES.len())],
        n_cells: rng.below(13) as u32,
        energy: rng.exponential(0.8),
        m02: rng.uniform(0., 1.5),
        tof: rng.normal(5e-8, 1e-8).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_reproducible() {
        let evgen = EventGenerator::new(BetheBlochResponse::default(), 256504);
        let mut rng1 = RandomGenerator::new(3);
        let mut rng2 = RandomGenerator::new(3);
        for _ in 0..20 {
            assert_eq!(evgen.generate(&mut rng1), evgen.generate(&mut rng2));
        }
    }

    #[test]
    fn events_cover_the_interesting_cases() {
        let evgen = EventGenerator::new(BetheBlochResponse::default(), 256504);
        let mut rng = RandomGenerator::new(11);
        let events = (0..2000).map(|_| evgen.generate(&mut rng)).collect::<Vec<_>>();

        assert!(events.iter().all(|ev| ev.header.is_some()));
        assert!(events.iter().any(|ev| ev.primary_vertex.is_none()));
        let vertex_zs = events
            .iter()
            .filter_map(|ev| ev.primary_vertex.as_ref().map(Vertex::z))
            .collect::<Vec<_>>();
        assert!(vertex_zs.iter().any(|z| z.abs() > 20.));
        assert!(vertex_zs.iter().any(|z| z.abs() < 20.));

        let tracks = events.iter().flat_map(|ev| &ev.tracks).collect::<Vec<_>>();
        assert!(tracks.iter().any(|t| t.test_filter_bit(1)));
        assert!(tracks.iter().any(|t| !t.test_filter_bit(1)));
        assert!(tracks.iter().all(|t| t.p >= t.pt));

        let clusters = events
            .iter()
            .flat_map(|ev| &ev.calo_clusters)
            .collect::<Vec<_>>();
        for cluster_type in CLUSTER_TYPES {
            assert!(clusters.iter().any(|c| c.cluster_type == cluster_type));
        }
        assert!(clusters.iter().any(|c| c.n_cells == 0));
    }
}
