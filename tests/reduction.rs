//! End-to-end checks of the reducer against hand-built and generated events

use approx::assert_relative_eq;
use calo_response::{
    conversion::V0Reader,
    event::{CaloCluster, ClusterType, Event, EventHeader, Track, TriggerMask, Vertex},
    evgen::EventGenerator,
    pid::{BetheBlochResponse, Species},
    random::RandomGenerator,
    reducer::keys,
    EventReducer, HistogramSet, Outcome, ReducerConfig, ServiceRegistry,
};

fn single_track_event() -> Event {
    Event {
        header: Some(EventHeader {
            run_number: 256504,
            trigger_mask: TriggerMask::INT7,
        }),
        primary_vertex: Some(Vertex::new(0., 0., 0.)),
        tracks: vec![Track {
            pt: 1.2,
            p: 1.3,
            filter_map: Track::FILTER_BIT_MIN_BIAS,
            tpc_signal: 55.,
            tpc_refit: true,
            tpc_crossed_rows: 120.,
            tpc_findable_clusters: 130,
        }],
        calo_clusters: vec![CaloCluster {
            cluster_type: ClusterType::PhosNeutral,
            n_cells: 3,
            energy: 0.8,
            m02: 0.3,
            tof: 2e-8,
        }],
        v0s: Vec::new(),
    }
}

#[test]
fn single_event_calo_response() {
    // No conversion service: the photon count stays out of the picture
    let services = ServiceRegistry::new().with_pid(|_: &Track, species: Species| {
        assert_eq!(species, Species::Electron);
        Some(2.)
    });
    let mut reducer =
        EventReducer::create_outputs(ReducerConfig::calo_response(), &services).unwrap();
    assert_eq!(reducer.reduce(&single_track_event()), Outcome::Reduced);
    let out = reducer.finalize();

    let pt = out.hist_1d(keys::EVENT_PT).unwrap();
    assert_eq!(pt.entries(), 1);
    assert_relative_eq!(pt.content_at(1.2), 1.);

    let tpc = out.hist_2d(keys::TPC_RESPONSE).unwrap();
    assert_eq!(tpc.entries(), 1);
    assert_relative_eq!(tpc.content_at(1.3, 55.), 1.);

    let selected = out.hist_1d(keys::SELECTED_EVENTS).unwrap();
    for step in [0., 1., 2., 3.] {
        assert_relative_eq!(selected.content_at(step), 1.);
    }
    assert_relative_eq!(selected.content_at(4.), 0.);
    assert_eq!(selected.entries(), 4);

    let vertex_z = out.hist_1d(keys::VERTEX_Z).unwrap();
    assert_eq!(vertex_z.entries(), 1);
    assert_relative_eq!(vertex_z.content_at(0.), 1.);

    let electrons = out.hist_2d(keys::ELECTRON_SIGNAL).unwrap();
    assert_eq!(electrons.entries(), 1);
    assert_relative_eq!(electrons.content_at(1.2, 2.), 1.);

    let energy = out.hist_1d(keys::CLUSTER_ENERGY).unwrap();
    assert_eq!(energy.entries(), 1);
    assert_relative_eq!(energy.content_at(0.8), 1.);

    assert_eq!(out.get(keys::RECONSTRUCTED_PHOTONS).unwrap().entries(), 0);
}

#[test]
fn republished_state_accumulates() {
    let services = ServiceRegistry::new().with_pid(|_: &Track, _: Species| Some(2.));
    let mut reducer =
        EventReducer::create_outputs(ReducerConfig::calo_response(), &services).unwrap();
    let event = single_track_event();
    reducer.reduce(&event);
    let after_one = reducer.outputs().clone();
    reducer.reduce(&event);
    let pt = reducer.outputs().hist_1d(keys::EVENT_PT).unwrap();
    assert_relative_eq!(pt.content_at(1.2), 2.);
    assert_relative_eq!(
        after_one.hist_1d(keys::EVENT_PT).unwrap().content_at(1.2),
        1.
    );
}

fn reduce_all(config: &ReducerConfig, services: &ServiceRegistry, events: &[Event]) -> HistogramSet {
    let mut reducer = EventReducer::create_outputs(config.clone(), services).unwrap();
    for event in events {
        reducer.reduce(event);
    }
    reducer.finalize()
}

#[test]
fn shard_merging_matches_a_single_pass() {
    let services = ServiceRegistry::new()
        .with_pid(BetheBlochResponse::default())
        .with_conversion("fV0ReaderV1", V0Reader::default());
    let evgen = EventGenerator::new(BetheBlochResponse::default(), 256504);
    let mut rng = RandomGenerator::new(2022);
    let events = (0..600).map(|_| evgen.generate(&mut rng)).collect::<Vec<_>>();

    for config in [ReducerConfig::calo_response(), ReducerConfig::sigma0_pcm_phos()] {
        let single_pass = reduce_all(&config, &services, &events);

        let (first, rest) = events.split_at(250);
        let (second, third) = rest.split_at(100);
        let mut forward = reduce_all(&config, &services, first);
        forward.merge(reduce_all(&config, &services, second)).unwrap();
        forward.merge(reduce_all(&config, &services, third)).unwrap();

        let mut backward = reduce_all(&config, &services, third);
        backward.merge(reduce_all(&config, &services, second)).unwrap();
        backward.merge(reduce_all(&config, &services, first)).unwrap();

        assert_eq!(forward, single_pass);
        assert_eq!(backward, single_pass);
        assert!(single_pass.get(keys::EVENT_PT).unwrap().entries() > 0);
        assert!(single_pass.get(keys::RECONSTRUCTED_PHOTONS).unwrap().entries() > 0);
    }
}

#[test]
fn generated_events_respect_the_selection_invariants() {
    let services = ServiceRegistry::new()
        .with_pid(BetheBlochResponse::default())
        .with_conversion("fV0ReaderV1", V0Reader::default());
    let evgen = EventGenerator::new(BetheBlochResponse::default(), 256504);
    let mut rng = RandomGenerator::new(7);
    let events = (0..500).map(|_| evgen.generate(&mut rng)).collect::<Vec<_>>();
    let out = reduce_all(&ReducerConfig::calo_response(), &services, &events);

    let selected = out.hist_1d(keys::SELECTED_EVENTS).unwrap();
    let tracks = selected.content_at(0.);
    let in_window = selected.content_at(1.);
    let electrons = selected.content_at(2.);

    // Each selection step only narrows down the previous one
    assert!(tracks >= in_window && in_window >= electrons && electrons > 0.);
    assert_relative_eq!(selected.content_at(4.), 0.);
    assert_eq!(out.get(keys::EVENT_PT).unwrap().entries() as f64, tracks as f64);
    assert_eq!(out.get(keys::VERTEX_Z).unwrap().entries() as f64, in_window as f64);
    assert_eq!(
        out.get(keys::ELECTRON_SIGNAL).unwrap().entries() as f64,
        electrons as f64
    );
    assert_eq!(
        out.get(keys::CLUSTER_ENERGY).unwrap().entries() as f64,
        selected.content_at(3.) as f64
    );
}
